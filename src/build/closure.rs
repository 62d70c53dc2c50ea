//! Closure run: apply the built weights to the reference sample.
//!
//! Works at histogram level: every reference bin is weighted by the weight at
//! its centre. The output mirrors what an analysis job filling weighted
//! histograms would write and is the debug input of `fix_normalization`.

use tracing::info;

use crate::build::{debug_norm_name, debug_xb_name, debug_xb_pt_name, WeightSet};
use crate::domain::{Observable, WeightConfig};
use crate::error::AppError;
use crate::hist::{Axis, Hist1D, Hist2D};
use crate::io::Container;

#[derive(Debug, Clone, PartialEq)]
pub struct ClosureRow {
    pub tune: String,
    pub norm: f64,
    pub weighted: f64,
}

#[derive(Debug, Clone)]
pub struct ClosureOutput {
    pub container: Container,
    pub rows: Vec<ClosureRow>,
}

fn yield_hist(name: &str, value: f64) -> Result<Hist1D, AppError> {
    Hist1D::from_counts(name, Axis::uniform(1, 0.0, 1.0)?, vec![value])
}

fn weighted_1d(h: &Hist1D, name: &str, w: impl Fn(f64) -> f64) -> Hist1D {
    let mut out = h.renamed(name);
    for i in 0..h.n_bins() {
        let f = w(h.axis().center(i));
        out.set_bin(i, h.content(i) * f, h.error(i) * f.abs());
    }
    out
}

fn weighted_2d(h: &Hist2D, name: &str, w: impl Fn(f64, f64) -> f64) -> Hist2D {
    let mut out = h.renamed(name);
    for iy in 0..h.y_axis().n_bins() {
        for ix in 0..h.x_axis().n_bins() {
            let f = w(h.x_axis().center(ix), h.y_axis().center(iy));
            out.set_bin(ix, iy, h.content(ix, iy) * f, h.error(ix, iy) * f.abs());
        }
    }
    out
}

/// Weight the reference `xb_lead_B` / `xb_pt_lead_B` counts with every tune's
/// smooth weights. `weights` must carry surfaces.
pub fn run_closure(reference: &Container, weights: &WeightSet, config: &WeightConfig) -> Result<ClosureOutput, AppError> {
    if !weights.has_surfaces() {
        return Err(AppError::input("Closure needs the 2-D weight surfaces."));
    }
    let xb = reference.get_hist1d(&config.hist_path(Observable::XbLeadB))?;
    let xb_pt = reference.get_hist2d(&config.hist_path(Observable::XbPtLeadB))?;
    let norm = xb.sum();

    let mut out = Container::new();
    out.put(&config.object_path("norm"), yield_hist("norm", norm)?)?;
    out.put(&config.hist_path(Observable::XbPtLeadB), xb_pt.clone())?;

    let mut rows = Vec::with_capacity(config.tunes.len());
    for tune in &config.tunes {
        let missing = || AppError::input(format!("tune {tune}: no weights loaded."));
        weights.frag_weight(tune, 0.0).ok_or_else(missing)?;
        let w1 = |x: f64| weights.frag_weight(tune, x).unwrap_or(1.0);
        let w2 = |x: f64, pt: f64| weights.frag_weight_vs_pt(tune, x, pt).unwrap_or(1.0);

        let h1 = weighted_1d(&xb, &debug_xb_name(tune), w1);
        let weighted = h1.sum();
        out.put(&config.object_path(&debug_norm_name(tune)), yield_hist(&debug_norm_name(tune), weighted)?)?;
        out.put(&config.object_path(h1.name()), h1)?;
        let h2 = weighted_2d(&xb_pt, &debug_xb_pt_name(tune), w2);
        out.put(&config.object_path(h2.name()), h2)?;

        info!(tune = %tune, norm, weighted, "closure");
        rows.push(ClosureRow {
            tune: tune.clone(),
            norm,
            weighted,
        });
    }
    Ok(ClosureOutput { container: out, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hist::Graph;

    #[test]
    fn weights_scale_reference_bins() {
        let config = WeightConfig {
            reference: "R".to_string(),
            tunes: vec!["T".to_string()],
            ..WeightConfig::default()
        };
        let x = Axis::uniform(2, 0.0, 1.0).unwrap();
        let y = Axis::new(vec![20.0, 5000.0]).unwrap();
        let mut reference = Container::new();
        reference
            .put("bfragAnalysis/xb_lead_B", Hist1D::from_counts("xb", x.clone(), vec![10.0, 30.0]).unwrap())
            .unwrap();
        let mut h2 = Hist2D::new("xb_pt", x.clone(), y.clone());
        h2.set_bin(0, 0, 10.0, 1.0);
        h2.set_bin(1, 0, 30.0, 1.0);
        reference.put("bfragAnalysis/xb_pt_lead_B", h2).unwrap();

        let mut w1 = Container::new();
        w1.put("fragT_smooth", Graph::new("g", vec![0.0, 1.0], vec![0.0, 2.0]).unwrap()).unwrap();
        let mut surface = Hist2D::new("fragT_smooth", x, y);
        surface.set_bin(0, 0, 2.0, 0.0);
        surface.set_bin(1, 0, 1.0, 0.0);
        let mut w2 = Container::new();
        w2.put("fragT_smooth", surface).unwrap();
        let set = WeightSet::from_containers(&w1, Some(&w2), None, &config.tunes, &[]).unwrap();

        let out = run_closure(&reference, &set, &config).unwrap();
        // 10 * 0.5 + 30 * 1.5
        assert_eq!(out.rows[0].weighted, 50.0);
        assert_eq!(out.rows[0].norm, 40.0);
        let c = &out.container;
        assert_eq!(c.get_hist1d("bfragAnalysis/norm").unwrap().content(0), 40.0);
        assert_eq!(c.get_hist1d("bfragAnalysis/debug_norm_fragT").unwrap().content(0), 50.0);
        let d2 = c.get_hist2d("bfragAnalysis/debug_xb_pt_lead_B_fragTVsPt").unwrap();
        assert_eq!(d2.content(0, 0), 20.0);
        assert_eq!(d2.content(1, 0), 30.0);
        assert!(c.get_hist1d("bfragAnalysis/debug_xb_lead_B_fragT").is_ok());
    }
}
