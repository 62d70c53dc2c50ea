//! Command-line parsing for the fragmentation-weight tools.
//!
//! Argument parsing and command dispatch stay separate from the weight
//! derivation itself; handlers live in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::SmoothingStrategy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bfrag", version, about = "b-fragmentation and B-decay reweighting tools")]
pub struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: tracing::Level,

    /// JSON file overriding the default configuration.
    #[arg(long, global = true, value_name = "JSON")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build 1-D x_b weights for every tune.
    Build(BuildArgs),
    /// Build x_b weights in slices of jet pT.
    Build2d(BuildArgs),
    /// Rescale built weights using the yields of a closure run.
    FixNorm(FixNormArgs),
    /// Apply built weights to the reference inputs and record the yields.
    Closure(ClosureArgs),
    /// Build semileptonic branching-ratio weights.
    Br(BrArgs),
    /// Generate toy input histograms for every tune.
    Toy(ToyArgs),
    /// Evaluate all weights for a single jet.
    Weights(WeightsArgs),
    /// Print the effective configuration as JSON.
    Config,
}

#[derive(Debug, Args, Clone)]
pub struct BuildArgs {
    /// Directory holding `xb_<TUNE>.json` for every tune.
    #[arg(short, long, value_name = "DIR")]
    pub input: PathBuf,

    /// Output directory.
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Override the configured smoothing strategy.
    #[arg(long, value_enum)]
    pub strategy: Option<SmoothingStrategy>,
}

#[derive(Debug, Args, Clone)]
pub struct FixNormArgs {
    /// Directory with the weight files to fix.
    #[arg(short, long, value_name = "DIR")]
    pub input: PathBuf,

    /// Closure output holding the yields.
    #[arg(short, long, value_name = "JSON")]
    pub debug: PathBuf,

    /// Output directory for the fixed weight files.
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ClosureArgs {
    /// Directory holding the reference tune input.
    #[arg(short, long, value_name = "DIR")]
    pub input: PathBuf,

    /// Directory with the weight files.
    #[arg(short, long, value_name = "DIR")]
    pub weights: PathBuf,

    /// Output container.
    #[arg(short, long, value_name = "JSON")]
    pub output: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct BrArgs {
    /// Output container.
    #[arg(short, long, value_name = "JSON")]
    pub output: PathBuf,

    /// Analysis output with the semileptonic-decay monitor graphs.
    #[arg(long, value_name = "JSON")]
    pub monitor: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ToyArgs {
    /// Output directory.
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Jets per tune.
    #[arg(short = 'n', long, default_value_t = 200_000)]
    pub events: usize,

    /// Random seed (combined with the tune name).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct WeightsArgs {
    /// Directory with the weight files.
    #[arg(short, long, value_name = "DIR")]
    pub weights: PathBuf,

    /// Leading B-hadron momentum fraction.
    #[arg(long)]
    pub xb: f64,

    /// Jet pT (GeV).
    #[arg(long, default_value_t = 30.0)]
    pub pt: f64,

    /// PDG id of the leading B hadron (0: no tagged hadron).
    #[arg(long, default_value_t = 511, allow_hyphen_values = true)]
    pub pdg_id: i32,

    /// The hadron decays semileptonically.
    #[arg(long)]
    pub semilep: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::parse_from([
            "bfrag", "build", "-i", "in", "-o", "out", "--strategy", "poly", "--log-level", "debug",
        ]);
        assert_eq!(cli.log_level, tracing::Level::DEBUG);
        match cli.command {
            Command::Build(args) => assert_eq!(args.strategy, Some(SmoothingStrategy::PolynomialSpline)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
