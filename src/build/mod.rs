//! Weight builders and the tools around them.
//!
//! - `one_d`: per-tune x_b weight graphs
//! - `two_d`: per-tune x_b × jet-pT weight surfaces
//! - `normfix`: rescale built weights from a closure run
//! - `closure`: apply weights to the reference at histogram level
//! - `apply`: per-jet weight evaluation
//! - `branching`: semileptonic branching-ratio weights

pub mod apply;
pub mod branching;
pub mod closure;
pub mod normfix;
pub mod one_d;
pub mod two_d;

pub use apply::*;
pub use branching::*;
pub use closure::*;
pub use normfix::*;
pub use one_d::*;
pub use two_d::*;

use tracing::debug;

use crate::domain::{AbovePolicy, WeightConfig};
use crate::error::AppError;
use crate::fit::{smooth_weights, SmootherSettings};
use crate::hist::{smooth_range, to_density, Graph, Hist1D};

/// Counts -> unit density, then range smoothing. Returns a new histogram.
pub(crate) fn smoothed_density(counts: &Hist1D, config: &WeightConfig, name: &str) -> Result<Hist1D, AppError> {
    let mut h = counts.renamed(name);
    to_density(&mut h);
    smooth_range(&mut h, config.smooth_repeat, config.smooth_min, config.smooth_max)?;
    Ok(h)
}

/// Raw and smoothed weights of one tune histogram against a prepared
/// (density, smoothed) reference.
pub(crate) struct DerivedWeights {
    pub raw: Graph,
    pub smooth: Graph,
    /// Tune density after smoothing; kept for debug output.
    pub density: Hist1D,
}

pub(crate) fn derive_weights(
    tune_counts: &Hist1D,
    reference: &Hist1D,
    config: &WeightConfig,
    raw_name: &str,
    smooth_name: &str,
) -> Result<DerivedWeights, AppError> {
    let mut unsmoothed = tune_counts.renamed(raw_name);
    to_density(&mut unsmoothed);
    let (raw_ratio, zero_raw) = unsmoothed.divide(reference, raw_name)?;
    let raw = raw_ratio.to_graph(raw_name)?;

    let density = smoothed_density(tune_counts, config, tune_counts.name())?;
    let (ratio, zero) = density.divide(reference, smooth_name)?;
    if zero_raw + zero > 0 {
        debug!(curve = raw_name, bins = zero.max(zero_raw), "reference bins at zero, ratio set to 0");
    }
    let settings = SmootherSettings::from_config(config, AbovePolicy::PinToOne);
    let smooth = smooth_weights(&ratio, reference, &settings, smooth_name)?;
    Ok(DerivedWeights { raw, smooth, density })
}
