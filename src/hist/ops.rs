//! Histogram transformations used by the weight builders.
//!
//! - `to_density`: counts -> unit-integral density
//! - `smooth_range`: repeated local averaging restricted to a bin range
//! - `rebin_range`: merge groups of bins inside a range, keep the rest

use crate::error::AppError;
use crate::hist::{Axis, Hist1D};

/// Convert counts to a probability density, in place.
///
/// Contents and errors are divided by the bin width; if the resulting integral
/// (`Σ content × width`) is positive the histogram is scaled to integrate to 1.
/// A non-positive integral leaves the width-divided values as they are.
pub fn to_density(h: &mut Hist1D) {
    for i in 0..h.n_bins() {
        let w = h.axis().width(i);
        let (c, e) = (h.content(i), h.error(i));
        h.set_bin(i, c / w, e / w);
    }
    let integral = h.integral();
    if integral > 0.0 {
        h.scale(1.0 / integral);
    }
}

/// Smooth the bins inside `[x_min, x_max]` `repeat` times.
///
/// Both bounds must be bin edges; a bin whose lower edge equals `x_max` is not
/// smoothed. Each pass replaces `c[i]` by `(c[i-1] + 2 c[i] + c[i+1]) / 4`
/// using in-range neighbours only (the range ends reuse their own value), so a
/// flat range stays flat. Errors and out-of-range bins are left untouched.
pub fn smooth_range(h: &mut Hist1D, repeat: usize, x_min: f64, x_max: f64) -> Result<(), AppError> {
    let (first, end) = h
        .axis()
        .edge_range(x_min, x_max)
        .map_err(|e| e.context(format!("smoothing '{}'", h.name())))?;

    let contents = h.contents_mut();
    for _ in 0..repeat {
        let src = contents[first..end].to_vec();
        let n = src.len();
        if n < 2 {
            break;
        }
        for k in 0..n {
            let left = src[k.saturating_sub(1)];
            let right = src[(k + 1).min(n - 1)];
            contents[first + k] = 0.25 * left + 0.5 * src[k] + 0.25 * right;
        }
    }
    Ok(())
}

/// Merge groups of `factor` bins inside `[x_min, x_max]` into a new histogram.
///
/// Contents add, errors add in quadrature. Bins outside the range keep their
/// edges. Fails (without producing anything) when the bounds are not bin edges
/// or the number of bins in range is not a multiple of `factor`.
pub fn rebin_range(h: &Hist1D, factor: usize, x_min: f64, x_max: f64) -> Result<Hist1D, AppError> {
    if factor == 0 {
        return Err(AppError::consistency(format!(
            "Rebin factor for '{}' must be positive.",
            h.name()
        )));
    }
    let (first, last) = h
        .axis()
        .edge_range(x_min, x_max)
        .map_err(|e| e.context(format!("rebinning '{}'", h.name())))?;
    let n_in = last - first;
    if n_in % factor != 0 {
        return Err(AppError::consistency(format!(
            "Cannot rebin '{}': {n_in} bins in [{x_min}, {x_max}] are not divisible by {factor}.",
            h.name()
        )));
    }

    let old = h.axis().edges();
    let mut edges = Vec::with_capacity(old.len());
    edges.extend_from_slice(&old[..first]);
    edges.extend(old[first..=last].iter().step_by(factor).copied());
    edges.extend_from_slice(&old[last + 1..]);

    let mut contents = Vec::with_capacity(edges.len() - 1);
    let mut errors = Vec::with_capacity(edges.len() - 1);
    let mut push_group = |bins: std::ops::Range<usize>| {
        if bins.len() == 1 {
            contents.push(h.content(bins.start));
            errors.push(h.error(bins.start));
            return;
        }
        let c: f64 = bins.clone().map(|i| h.content(i)).sum();
        let e2: f64 = bins.map(|i| h.error(i).powi(2)).sum();
        contents.push(c);
        errors.push(e2.sqrt());
    };
    for i in 0..first {
        push_group(i..i + 1);
    }
    for g in (first..last).step_by(factor) {
        push_group(g..g + factor);
    }
    for i in last..h.n_bins() {
        push_group(i..i + 1);
    }

    Hist1D::from_parts(h.name(), Axis::new(edges)?, contents, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(edges: &[f64], contents: &[f64]) -> Hist1D {
        Hist1D::from_counts("h", Axis::new(edges.to_vec()).unwrap(), contents.to_vec()).unwrap()
    }

    #[test]
    fn density_of_uniform_counts_integrates_to_one() {
        let mut h = hist(&[0.0, 1.0, 2.0, 3.0, 4.0], &[1.0, 1.0, 1.0, 1.0]);
        to_density(&mut h);
        assert!((h.integral() - 1.0).abs() < 1e-12);
        for &c in h.contents() {
            assert!((c - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn density_shapes_agree_for_scaled_inputs() {
        let mut a = hist(&[0.0, 1.0, 2.0, 3.0, 4.0], &[1.0, 1.0, 1.0, 1.0]);
        let mut b = hist(&[0.0, 1.0, 2.0, 3.0, 4.0], &[2.0, 2.0, 2.0, 2.0]);
        to_density(&mut a);
        to_density(&mut b);
        for (x, y) in a.contents().iter().zip(b.contents()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn density_twice_keeps_unit_integral() {
        let mut h = hist(&[0.0, 0.1, 0.5, 0.6, 1.5], &[3.0, 10.0, 7.0, 2.0]);
        to_density(&mut h);
        assert!((h.integral() - 1.0).abs() < 1e-12);
        to_density(&mut h);
        assert!((h.integral() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn density_with_empty_histogram_is_finite() {
        let mut h = hist(&[0.0, 1.0, 3.0], &[0.0, 0.0]);
        to_density(&mut h);
        assert!(h.contents().iter().all(|c| *c == 0.0));
    }

    #[test]
    fn smoothing_leaves_outside_bins_untouched() {
        let edges: Vec<f64> = (0..=8).map(|i| i as f64 * 0.25).collect();
        let contents = [5.0, 1.0, 9.0, 2.0, 8.0, 3.0, 7.0, 4.0];
        let mut h = hist(&edges, &contents);
        smooth_range(&mut h, 3, 0.5, 1.5).unwrap();
        assert_eq!(h.content(0), 5.0);
        assert_eq!(h.content(1), 1.0);
        assert_eq!(h.content(6), 7.0);
        assert_eq!(h.content(7), 4.0);
        assert_ne!(h.content(3), 2.0);
    }

    #[test]
    fn smoothing_excludes_bin_starting_at_upper_bound() {
        let mut h = hist(&[0.0, 1.0, 2.0, 3.0], &[1.0, 5.0, 9.0]);
        smooth_range(&mut h, 1, 0.0, 2.0).unwrap();
        assert_eq!(h.content(2), 9.0);
        assert!((h.content(0) - 2.0).abs() < 1e-12);
        assert!((h.content(1) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn smoothing_keeps_flat_range_flat() {
        let mut h = hist(&[0.0, 1.0, 2.0, 3.0, 4.0], &[2.0, 2.0, 2.0, 2.0]);
        smooth_range(&mut h, 5, 0.0, 4.0).unwrap();
        assert!(h.contents().iter().all(|c| (c - 2.0).abs() < 1e-12));
    }

    #[test]
    fn smoothing_misaligned_range_fails_before_mutation() {
        let mut h = hist(&[0.0, 1.0, 2.0, 3.0], &[1.0, 5.0, 9.0]);
        let before = h.clone();
        assert!(smooth_range(&mut h, 2, 0.0, 1.5).is_err());
        assert_eq!(h, before);
    }

    #[test]
    fn rebin_factor_one_is_identity() {
        let h = hist(&[0.0, 0.2, 0.4, 0.5, 0.6, 1.0], &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let r = rebin_range(&h, 1, 0.2, 0.6).unwrap();
        assert_eq!(r, h);
    }

    #[test]
    fn rebin_merges_only_inside_range() {
        let h = hist(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let r = rebin_range(&h, 2, 1.0, 5.0).unwrap();
        assert_eq!(r.axis().edges(), &[0.0, 1.0, 3.0, 5.0, 6.0]);
        assert_eq!(r.contents(), &[1.0, 5.0, 9.0, 6.0]);
        assert!((r.error(1) - 5.0_f64.sqrt()).abs() < 1e-12);
        assert!((r.sum() - h.sum()).abs() < 1e-12);
    }

    #[test]
    fn rebin_rejects_uneven_groups() {
        let edges: Vec<f64> = (0..=7).map(|i| i as f64).collect();
        let h = hist(&edges, &[1.0; 7]);
        let err = rebin_range(&h, 3, 0.0, 7.0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Consistency);
        assert!(rebin_range(&h, 0, 0.0, 7.0).is_err());
        assert!(rebin_range(&h, 1, 0.5, 7.0).is_err());
    }
}
