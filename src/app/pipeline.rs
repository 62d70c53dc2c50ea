//! Shared command workflows.
//!
//! Each function runs one command end to end: read inputs, compute, write the
//! output containers. The CLI handlers only add terminal output, and the
//! integration tests drive these functions directly.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::build::{
    build_1d, build_2d, build_br_weights, fix_normalization, read_monitor, run_closure, BrWeights, ClosureOutput,
    FixedWeights, MonitorRow, WeightSet, Weights1D, Weights2D, WEIGHTS_1D_FILE, WEIGHTS_2D_DEBUG_FILE,
    WEIGHTS_2D_FILE,
};
use crate::data::{write_toy_inputs, ToyOptions};
use crate::domain::{Observable, WeightConfig};
use crate::error::AppError;
use crate::io::{Container, TuneInputs};

/// Load every tune's `xb_lead_B`, build the 1-D weights and write
/// `<output>/bfragweights.json`.
pub fn run_build_1d(input: &Path, output: &Path, config: &WeightConfig) -> Result<Weights1D, AppError> {
    info!(input = %input.display(), strategy = config.strategy.display_name(), "building 1-D weights");
    let inputs = TuneInputs::load(input, config, &[Observable::XbLeadB])?;
    let weights = build_1d(&inputs, config)?;
    let path = output.join(WEIGHTS_1D_FILE);
    weights.to_container()?.write(&path)?;
    info!(path = %path.display(), tunes = weights.tunes.len(), "wrote 1-D weights");
    Ok(weights)
}

/// Build the weight surfaces; writes the surfaces and the per-slice debug file.
pub fn run_build_2d(input: &Path, output: &Path, config: &WeightConfig) -> Result<Weights2D, AppError> {
    info!(input = %input.display(), slices = config.slices.len(), "building 2-D weights");
    let inputs = TuneInputs::load(input, config, &[Observable::XbPtLeadB])?;
    let weights = build_2d(&inputs, config)?;
    let path = output.join(WEIGHTS_2D_FILE);
    weights.to_container()?.write(&path)?;
    let debug_path = output.join(WEIGHTS_2D_DEBUG_FILE);
    weights.to_debug_container()?.write(&debug_path)?;
    info!(path = %path.display(), debug = %debug_path.display(), "wrote 2-D weights");
    Ok(weights)
}

/// Rescale the weight files in `input` with the yields in `debug`.
pub fn run_fix_norm(input: &Path, debug: &Path, output: &Path, config: &WeightConfig) -> Result<FixedWeights, AppError> {
    let w1 = Container::open(&input.join(WEIGHTS_1D_FILE))?;
    let w2 = Container::open(&input.join(WEIGHTS_2D_FILE))?;
    let yields = Container::open(debug)?;
    let mut fixed = fix_normalization(&w1, &w2, &yields, config)?;
    fixed.weights_1d.write(&output.join(WEIGHTS_1D_FILE))?;
    fixed.weights_2d.write(&output.join(WEIGHTS_2D_FILE))?;
    info!(output = %output.display(), "wrote normalization-fixed weights");
    Ok(fixed)
}

/// Weight the reference inputs with the weights in `weights` and write the
/// yields to `output`.
pub fn run_closure_check(
    input: &Path,
    weights: &Path,
    output: &Path,
    config: &WeightConfig,
) -> Result<ClosureOutput, AppError> {
    let reference = Container::open(&config.input_path(input, &config.reference))
        .map_err(|e| e.context(format!("reference {}", config.reference)))?;
    let set = WeightSet::load(weights, &config.tunes, &config.semilep_brs)?;
    let mut out = run_closure(&reference, &set, config)?;
    out.container.write(output)?;
    info!(output = %output.display(), "wrote closure yields");
    Ok(out)
}

pub fn run_br(
    output: &Path,
    monitor: Option<&Path>,
    config: &WeightConfig,
) -> Result<(BrWeights, Option<Vec<MonitorRow>>), AppError> {
    let weights = build_br_weights(&config.semilep_brs)?;
    let rows = match monitor {
        Some(path) => Some(read_monitor(&Container::open(path)?, &config.analysis_dir, &config.semilep_brs)?),
        None => None,
    };
    weights.to_container()?.write(output)?;
    info!(output = %output.display(), "wrote branching-ratio weights");
    Ok((weights, rows))
}

pub fn run_toy(output: &Path, options: &ToyOptions, config: &WeightConfig) -> Result<Vec<PathBuf>, AppError> {
    write_toy_inputs(output, config, options)
}
