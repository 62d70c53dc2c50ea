//! 2-D fragmentation weights: x_b weight surfaces binned in jet pT.
//!
//! Each pT slice gets its own weight curve, derived exactly like the 1-D
//! weights from the slice's x_b projection (after the slice's rebin rules).
//! The curves are then sampled on a fine uniform x grid to fill a surface
//! whose y axis is the input pT binning.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::build::{derive_weights, smoothed_density};
use crate::domain::{frag_name, frag_smooth_name, Observable, PtSlice, WeightConfig};
use crate::error::AppError;
use crate::hist::{rebin_range, Axis, Graph, Hist1D, Hist2D};
use crate::io::{Container, TuneInputs};

pub const WEIGHTS_2D_FILE: &str = "bfragweights_vs_pt.json";
pub const WEIGHTS_2D_DEBUG_FILE: &str = "bfragweights_vs_pt_debug.json";

#[derive(Debug, Clone)]
pub struct SliceWeights {
    pub label: String,
    pub raw: Graph,
    pub smooth: Graph,
    pub density: Hist1D,
}

#[derive(Debug, Clone)]
pub struct TuneWeights2D {
    pub tune: String,
    pub slices: Vec<SliceWeights>,
    pub avg_raw: Graph,
    pub avg_smooth: Graph,
    pub raw_surface: Hist2D,
    pub smooth_surface: Hist2D,
    /// Jet-pT spectrum of the tune.
    pub pt: Hist1D,
}

#[derive(Debug, Clone)]
pub struct Weights2D {
    pub reference: String,
    /// Smoothed reference densities per slice, in slice order.
    pub reference_densities: Vec<Hist1D>,
    pub reference_pt: Hist1D,
    pub tunes: Vec<TuneWeights2D>,
}

impl Weights2D {
    /// Weight surfaces `frag<TUNE>` (raw) and `frag<TUNE>_smooth`.
    pub fn to_container(&self) -> Result<Container, AppError> {
        let mut c = Container::new();
        for t in &self.tunes {
            c.put(t.raw_surface.name(), t.raw_surface.clone())?;
            c.put(t.smooth_surface.name(), t.smooth_surface.clone())?;
        }
        Ok(c)
    }

    /// Per-slice densities and curves for inspection.
    pub fn to_debug_container(&self) -> Result<Container, AppError> {
        let mut c = Container::new();
        for h in &self.reference_densities {
            c.put(h.name(), h.clone())?;
        }
        c.put(self.reference_pt.name(), self.reference_pt.clone())?;
        for t in &self.tunes {
            for s in &t.slices {
                c.put(s.density.name(), s.density.clone())?;
                c.put(s.raw.name(), s.raw.clone())?;
                c.put(s.smooth.name(), s.smooth.clone())?;
            }
            c.put(t.avg_raw.name(), t.avg_raw.clone())?;
            c.put(t.avg_smooth.name(), t.avg_smooth.clone())?;
            c.put(t.pt.name(), t.pt.clone())?;
        }
        Ok(c)
    }
}

/// Project one slice onto x_b and apply its rebin rules.
fn slice_counts(h: &Hist2D, slice: &PtSlice, name: String) -> Result<Hist1D, AppError> {
    let mut out = h.project_x_range(name, slice.pt_min, slice.pt_max)?;
    for rule in &slice.rebin {
        out = rebin_range(&out, rule.factor, rule.x_min, rule.x_max)?;
    }
    Ok(out)
}

/// Check every slice against the reference binning before doing any work:
/// pT bounds on y edges, rebin rules and the smoothing range on x edges.
pub fn validate_slices(reference: &Hist2D, config: &WeightConfig) -> Result<(), AppError> {
    if config.slices.is_empty() {
        return Err(AppError::consistency("No pT slices configured."));
    }
    for slice in &config.slices {
        let ctx = format!("slice '{}'", slice.label);
        let y = reference.y_axis();
        y.edge_range(slice.pt_min, slice.pt_max.unwrap_or(y.max()))
            .map_err(|e| e.context(&ctx))?;
        let mut probe = Hist1D::new("probe", reference.x_axis().clone());
        for rule in &slice.rebin {
            probe = rebin_range(&probe, rule.factor, rule.x_min, rule.x_max).map_err(|e| e.context(&ctx))?;
        }
        probe
            .axis()
            .edge_range(config.smooth_min, config.smooth_max)
            .map_err(|e| e.context(format!("{ctx}: smoothing range")))?;
    }
    Ok(())
}

fn slice_density_name(tune: &str, label: &str) -> String {
    format!("xb_{tune}_{label}")
}

/// Fill a surface on `grid × pt_axis`: row `iy` samples the curve of the
/// slice containing the row's lower pT edge, or `fallback` if none does.
fn fill_surface(
    name: String,
    grid: &Axis,
    pt_axis: &Axis,
    slices: &[PtSlice],
    curves: &[&Graph],
    fallback: &Graph,
) -> Hist2D {
    let mut out = Hist2D::new(name, grid.clone(), pt_axis.clone());
    for iy in 0..pt_axis.n_bins() {
        let pt = pt_axis.low_edge(iy);
        let curve = slices
            .iter()
            .position(|s| s.contains(pt))
            .map_or(fallback, |i| curves[i]);
        for ix in 0..grid.n_bins() {
            out.set_bin(ix, iy, curve.eval(grid.center(ix)), 0.0);
        }
    }
    out
}

pub fn build_2d(inputs: &TuneInputs, config: &WeightConfig) -> Result<Weights2D, AppError> {
    let obs = Observable::XbPtLeadB;
    let reference = inputs.reference();
    let ref_hist = inputs.hist2d(reference, obs)?;
    validate_slices(ref_hist, config)?;

    let ref_ctx = |e: AppError| e.context(format!("reference {reference}"));
    let mut reference_densities = Vec::with_capacity(config.slices.len());
    for slice in &config.slices {
        let counts = slice_counts(ref_hist, slice, slice_density_name(reference, &slice.label))
            .and_then(|h| smoothed_density(&h, config, h.name()))
            .map_err(|e| ref_ctx(e.context(format!("slice '{}'", slice.label))))?;
        reference_densities.push(counts);
    }
    let ref_avg = smoothed_density(&ref_hist.project_x(format!("xb_{reference}_avg")), config, &format!("xb_{reference}_avg"))
        .map_err(ref_ctx)?;

    let grid = Axis::uniform(config.grid_bins, 0.0, config.max)?;
    let pt_axis = ref_hist.y_axis().clone();
    for iy in 0..pt_axis.n_bins() {
        if !config.slices.iter().any(|s| s.contains(pt_axis.low_edge(iy))) {
            debug!(pt = pt_axis.low_edge(iy), "pT bin outside all slices uses the average weights");
        }
    }

    let tunes = inputs
        .tunes()
        .par_iter()
        .map(|tune| {
            let h = inputs.hist2d(tune, obs)?;
            let raw_base = frag_name(tune);
            let mut slices = Vec::with_capacity(config.slices.len());
            for (slice, ref_density) in config.slices.iter().zip(&reference_densities) {
                let ctx = format!("tune {tune}, slice '{}'", slice.label);
                let counts = slice_counts(h, slice, slice_density_name(tune, &slice.label))
                    .map_err(|e| e.context(&ctx))?;
                let raw_name = format!("{raw_base}_{}", slice.label);
                let w = derive_weights(&counts, ref_density, config, &raw_name, &format!("{raw_name}_smooth"))
                    .map_err(|e| e.context(&ctx))?;
                slices.push(SliceWeights {
                    label: slice.label.clone(),
                    raw: w.raw,
                    smooth: w.smooth,
                    density: w.density,
                });
            }

            let avg_name = format!("{raw_base}_avg");
            let avg = derive_weights(
                &h.project_x(format!("xb_{tune}_avg")),
                &ref_avg,
                config,
                &avg_name,
                &format!("{avg_name}_smooth"),
            )
            .map_err(|e| e.context(format!("tune {tune}, average")))?;

            let raw_curves: Vec<&Graph> = slices.iter().map(|s| &s.raw).collect();
            let smooth_curves: Vec<&Graph> = slices.iter().map(|s| &s.smooth).collect();
            let raw_surface = fill_surface(raw_base.clone(), &grid, &pt_axis, &config.slices, &raw_curves, &avg.raw);
            let smooth_surface = fill_surface(
                frag_smooth_name(tune),
                &grid,
                &pt_axis,
                &config.slices,
                &smooth_curves,
                &avg.smooth,
            );
            info!(tune = %tune, slices = slices.len(), "built 2-D weights");

            Ok(TuneWeights2D {
                tune: tune.clone(),
                slices,
                avg_raw: avg.raw,
                avg_smooth: avg.smooth,
                raw_surface,
                smooth_surface,
                pt: h.project_y(format!("pt_{tune}")),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Weights2D {
        reference: reference.to_string(),
        reference_densities,
        reference_pt: ref_hist.project_y(format!("pt_{reference}")),
        tunes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RebinRule;

    fn hist2d(nx: usize) -> Hist2D {
        let x = Axis::uniform(nx, 0.0, 1.5).unwrap();
        let y = Axis::new(vec![20.0, 40.0, 60.0, 5000.0]).unwrap();
        let mut h = Hist2D::new("xb_pt_lead_B", x, y);
        for ix in 0..nx {
            for iy in 0..3 {
                h.set_bin(ix, iy, 10.0 + ix as f64, 1.0);
            }
        }
        h
    }

    #[test]
    fn validation_names_the_offending_slice() {
        let mut config = WeightConfig::default();
        config.slices = PtSlice::from_boundaries(&[20.0, 40.0]);
        config.slices[1].rebin.push(RebinRule {
            x_min: 0.0,
            x_max: 0.35,
            factor: 3,
        });
        // 0.05-wide bins: [0, 0.35] holds 7 bins, not divisible by 3.
        let err = validate_slices(&hist2d(30), &config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("slice 'pT40'"), "{err}");
    }

    #[test]
    fn validation_rejects_slice_bounds_off_the_pt_edges() {
        let mut config = WeightConfig::default();
        config.slices = PtSlice::from_boundaries(&[20.0, 45.0]);
        let err = validate_slices(&hist2d(30), &config).unwrap_err();
        assert!(err.to_string().contains("pT20To45"));
    }

    #[test]
    fn surface_rows_follow_slices_with_average_fallback() {
        let grid = Axis::uniform(3, 0.0, 1.5).unwrap();
        let pt = Axis::new(vec![10.0, 20.0, 40.0, 60.0]).unwrap();
        let slices = PtSlice::from_boundaries(&[20.0, 40.0]);
        let a = Graph::new("a", vec![0.0, 1.5], vec![2.0, 2.0]).unwrap();
        let b = Graph::new("b", vec![0.0, 1.5], vec![3.0, 3.0]).unwrap();
        let avg = Graph::new("avg", vec![0.0, 1.5], vec![1.0, 1.0]).unwrap();
        let s = fill_surface("s".to_string(), &grid, &pt, &slices, &[&a, &b], &avg);
        assert_eq!(s.content(0, 0), 1.0);
        assert_eq!(s.content(1, 1), 2.0);
        assert_eq!(s.content(2, 2), 3.0);
    }
}
