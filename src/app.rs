//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real entry point:
//! - parses CLI arguments and sets up logging
//! - loads the configuration
//! - runs the selected command
//! - prints summaries

use clap::Parser;
use tracing::debug;

use crate::build::{JetInfo, WeightSet};
use crate::cli::{BuildArgs, Cli, Command, WeightsArgs};
use crate::data::ToyOptions;
use crate::domain::WeightConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `bfrag` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = WeightConfig::load(cli.config.as_deref())?;
    debug!(?config, "configuration");

    match cli.command {
        Command::Build(args) => handle_build(args, config, false),
        Command::Build2d(args) => handle_build(args, config, true),
        Command::FixNorm(args) => {
            let fixed = pipeline::run_fix_norm(&args.input, &args.debug, &args.output, &config)?;
            println!("{}", crate::report::format_norm_factors(&fixed.factors));
            Ok(())
        }
        Command::Closure(args) => {
            let out = pipeline::run_closure_check(&args.input, &args.weights, &args.output, &config)?;
            println!("{}", crate::report::format_closure(&out.rows));
            Ok(())
        }
        Command::Br(args) => {
            let (weights, monitor) = pipeline::run_br(&args.output, args.monitor.as_deref(), &config)?;
            println!("{}", crate::report::format_br_table(&weights, monitor.as_deref()));
            Ok(())
        }
        Command::Toy(args) => {
            let options = ToyOptions {
                events: args.events,
                seed: args.seed,
            };
            for path in pipeline::run_toy(&args.output, &options, &config)? {
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::Weights(args) => handle_weights(args, &config),
        Command::Config => {
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| AppError::input(format!("Failed to serialize configuration: {e}")))?;
            println!("{json}");
            Ok(())
        }
    }
}

fn handle_build(args: BuildArgs, mut config: WeightConfig, vs_pt: bool) -> Result<(), AppError> {
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if vs_pt {
        let weights = pipeline::run_build_2d(&args.input, &args.output, &config)?;
        println!("{}", crate::report::format_2d_summary(&weights, &config));
    } else {
        let weights = pipeline::run_build_1d(&args.input, &args.output, &config)?;
        println!("{}", crate::report::format_1d_summary(&weights, &config));
    }
    Ok(())
}

fn handle_weights(args: WeightsArgs, config: &WeightConfig) -> Result<(), AppError> {
    let set = WeightSet::load(&args.weights, &config.tunes, &config.semilep_brs)?;
    let jet = JetInfo {
        pt: args.pt,
        xb: args.xb,
        lead_tag_id: args.pdg_id,
        has_semilep_decay: args.semilep,
    };
    println!("{}", crate::report::format_jet_weights(&set.jet_weights(&jet)));
    Ok(())
}
