//! Normalization fix-up from a closure run.
//!
//! Applying the weights jet by jet (rather than at bin centres) shifts the
//! overall normalization slightly. A closure run records, per tune, the
//! unweighted and weighted yields; the ratio `reference / weighted` rescales
//! the smooth weights so that the weighted yield matches again. The 2-D
//! weights get one factor per jet-pT bin.

use tracing::{debug, info};

use crate::domain::{frag_name, frag_smooth_name, WeightConfig};
use crate::error::AppError;
use crate::hist::Hist1D;
use crate::io::Container;

#[derive(Debug, Clone, PartialEq)]
pub struct NormFactors {
    pub tune: String,
    pub factor_1d: f64,
    /// One factor per pT bin of the weight surface.
    pub factors_2d: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct FixedWeights {
    pub weights_1d: Container,
    pub weights_2d: Container,
    pub factors: Vec<NormFactors>,
}

/// Name of the weighted-yield histogram the closure run writes per tune.
pub fn debug_norm_name(tune: &str) -> String {
    format!("debug_norm_{}", frag_name(tune))
}

pub fn debug_xb_name(tune: &str) -> String {
    format!("debug_xb_lead_B_{}", frag_name(tune))
}

pub fn debug_xb_pt_name(tune: &str) -> String {
    format!("debug_xb_pt_lead_B_{}VsPt", frag_name(tune))
}

fn ratio(reference: f64, weighted: f64, what: impl FnOnce() -> String) -> Result<f64, AppError> {
    let r = reference / weighted;
    if weighted == 0.0 || !r.is_finite() {
        return Err(AppError::numerical(format!(
            "{}: cannot rescale, reference {reference} / weighted {weighted}.",
            what()
        )));
    }
    Ok(r)
}

fn first_bin(debug: &Container, path: &str) -> Result<f64, AppError> {
    let h = debug.get_hist1d(path)?;
    Ok(h.content(0))
}

fn pt_projection(debug: &Container, path: &str) -> Result<Hist1D, AppError> {
    Ok(debug.get_hist2d(path)?.project_y(path))
}

/// Rescale the smooth weights of every configured tune.
///
/// Raw weights are copied unchanged. A ratio of exactly 1 leaves the weights
/// bit-for-bit unchanged; pT bins empty in both reference and weighted yield
/// keep factor 1.
pub fn fix_normalization(
    weights_1d: &Container,
    weights_2d: &Container,
    debug: &Container,
    config: &WeightConfig,
) -> Result<FixedWeights, AppError> {
    let mut out_1d = weights_1d.clone();
    let mut out_2d = weights_2d.clone();
    let mut factors = Vec::with_capacity(config.tunes.len());

    let norm_ref = first_bin(debug, &config.object_path("norm"))?;
    let ref_pt = pt_projection(debug, &config.object_path("xb_pt_lead_B"))?;

    for tune in &config.tunes {
        let smooth = frag_smooth_name(tune);
        let mut graph = weights_1d.get_graph(&smooth)?;
        let norm_tune = first_bin(debug, &config.object_path(&debug_norm_name(tune)))?;
        let factor_1d = ratio(norm_ref, norm_tune, || format!("tune {tune}, 1-D"))?;
        graph.scale_y(factor_1d);
        out_1d.put(&smooth, graph)?;

        let mut surface = weights_2d.get_hist2d(&smooth)?;
        let tune_pt = pt_projection(debug, &config.object_path(&debug_xb_pt_name(tune)))?;
        if !surface.y_axis().same_binning(ref_pt.axis()) || !surface.y_axis().same_binning(tune_pt.axis()) {
            return Err(AppError::input(format!(
                "tune {tune}: pT binning of the closure histograms differs from the weight surface."
            )));
        }
        let mut factors_2d = Vec::with_capacity(surface.y_axis().n_bins());
        for iy in 0..surface.y_axis().n_bins() {
            let (r, t) = (ref_pt.content(iy), tune_pt.content(iy));
            let f = if r == 0.0 && t == 0.0 {
                debug!(tune = %tune, bin = iy, "empty pT bin, factor 1");
                1.0
            } else {
                ratio(r, t, || format!("tune {tune}, 2-D pT bin {iy}"))?
            };
            surface.scale_row(iy, f);
            factors_2d.push(f);
        }
        out_2d.put(&smooth, surface)?;

        info!(tune = %tune, factor = factor_1d, "rescaled weights");
        factors.push(NormFactors {
            tune: tune.clone(),
            factor_1d,
            factors_2d,
        });
    }

    Ok(FixedWeights {
        weights_1d: out_1d,
        weights_2d: out_2d,
        factors,
    })
}
