//! Ratio histogram -> smooth, normalization-preserving weight curve.
//!
//! The curve has two parts:
//!
//! - fit region `[0, T]`: an interpolant through the ratio's bin centres,
//!   sampled uniformly and multiplied by a scale `k`
//! - tail `(T, MAX]`: fixed values (1, or the raw ratio), never rescaled
//!
//! Both parts share the abscissa `T`; the graph's left-wins rule makes the
//! weight at exactly `T` belong to the fit and everything above to the tail.
//!
//! `k` is chosen so that reweighting the reference leaves its integral
//! unchanged:
//!
//! ```text
//! Σ r_i (k a_i + b_i) = Σ r_i      =>      k = (Σ r_i - Σ r_i b_i) / Σ r_i a_i
//! ```
//!
//! with `r_i = content × width` of the reference, `a_i` the unscaled fit part
//! and `b_i` the tail part at the reference bin centres.

use tracing::{debug, warn};

use crate::domain::{AbovePolicy, PolyTails, SmoothingStrategy, WeightConfig};
use crate::error::AppError;
use crate::hist::{Graph, Hist1D};
use crate::math::{fit_polynomial, AkimaSpline, CubicSpline, Interpolant};

#[derive(Debug, Clone, PartialEq)]
pub struct SmootherSettings {
    pub threshold: f64,
    pub max: f64,
    pub above: AbovePolicy,
    pub strategy: SmoothingStrategy,
    pub fit_samples: usize,
    pub tail_samples: usize,
    pub poly: PolyTails,
}

impl SmootherSettings {
    pub fn from_config(config: &WeightConfig, above: AbovePolicy) -> Self {
        Self {
            threshold: config.threshold,
            max: config.max,
            above,
            strategy: config.strategy,
            fit_samples: config.fit_samples,
            tail_samples: config.tail_samples,
            poly: config.poly.clone(),
        }
    }
}

/// Fit-region points: bin centres `<= T`.
struct FitPoints {
    x: Vec<f64>,
    y: Vec<f64>,
    err: Vec<f64>,
}

fn fit_points(ratio: &Hist1D, threshold: f64) -> FitPoints {
    let mut p = FitPoints {
        x: Vec::new(),
        y: Vec::new(),
        err: Vec::new(),
    };
    for i in 0..ratio.n_bins() {
        let c = ratio.axis().center(i);
        if c <= threshold {
            p.x.push(c);
            p.y.push(ratio.content(i));
            p.err.push(ratio.error(i));
        }
    }
    p
}

/// Extend the knots to cover `[0, T]` with flat end values.
fn pad_to_range(x: &mut Vec<f64>, y: &mut Vec<f64>, threshold: f64) {
    if let (Some(&x0), Some(&y0)) = (x.first(), y.first()) {
        if x0 > 0.0 {
            x.insert(0, 0.0);
            y.insert(0, y0);
        }
    }
    if let (Some(&xn), Some(&yn)) = (x.last(), y.last()) {
        if xn < threshold {
            x.push(threshold);
            y.push(yn);
        }
    }
}

/// Replace the points inside `lo < x < hi` by a weighted polynomial fit.
fn replace_window(
    p: &mut FitPoints,
    lo: f64,
    hi: f64,
    degree: usize,
    threshold: f64,
    label: &str,
) -> Result<(), AppError> {
    let idx: Vec<usize> = (0..p.x.len()).filter(|&i| p.x[i] > lo && p.x[i] < hi).collect();
    if idx.is_empty() {
        if lo >= threshold {
            warn!(
                window = label,
                lo,
                threshold,
                "polynomial window lies above threshold, only one tail is fitted"
            );
        } else {
            warn!(window = label, lo, hi, "polynomial window contains no points, skipped");
        }
        return Ok(());
    }
    let xs: Vec<f64> = idx.iter().map(|&i| p.x[i]).collect();
    let ys: Vec<f64> = idx.iter().map(|&i| p.y[i]).collect();
    let ws: Vec<f64> = idx
        .iter()
        .map(|&i| {
            let e = p.err[i];
            if e.is_finite() && e > 0.0 { 1.0 / (e * e) } else { 1.0 }
        })
        .collect();
    let poly = fit_polynomial(&xs, &ys, &ws, degree).map_err(|e| e.context(format!("{label} window")))?;
    for &i in &idx {
        p.y[i] = poly.eval(p.x[i]);
    }
    Ok(())
}

/// Unscaled fit-region samples over `[0, T]`.
fn sample_fit_region(ratio: &Hist1D, s: &SmootherSettings) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    let mut p = fit_points(ratio, s.threshold);
    if p.x.is_empty() {
        return Err(AppError::numerical(format!(
            "No ratio bin centre lies at or below the threshold {}.",
            s.threshold
        )));
    }
    if p.y.iter().any(|v| !v.is_finite()) {
        return Err(AppError::numerical("Ratio contains non-finite values."));
    }
    let t = s.threshold;
    match s.strategy {
        SmoothingStrategy::AkimaSubspline => {
            pad_to_range(&mut p.x, &mut p.y, t);
            let spline = AkimaSpline::new(p.x, p.y)?;
            Ok(spline.sample_uniform(0.0, t, s.fit_samples))
        }
        SmoothingStrategy::PolynomialSpline => {
            let d = s.poly.degree;
            replace_window(&mut p, f64::NEG_INFINITY, s.poly.low_max.min(t + f64::EPSILON), d, t, "low")?;
            let high_hi = if s.poly.high_max > t { t + f64::EPSILON } else { s.poly.high_max };
            replace_window(&mut p, s.poly.high_min, high_hi, d, t, "high")?;
            pad_to_range(&mut p.x, &mut p.y, t);
            let spline = CubicSpline::new(p.x, p.y)?;
            Ok(spline.sample_uniform(0.0, t, s.fit_samples))
        }
    }
}

/// Tail samples: the point at `T` followed by `tail_samples` points on `(T, MAX]`.
fn sample_tail(ratio: &Hist1D, s: &SmootherSettings) -> (Vec<f64>, Vec<f64>) {
    let n = s.tail_samples.max(1);
    let step = (s.max - s.threshold) / n as f64;
    let xs: Vec<f64> = (0..=n)
        .map(|j| if j == n { s.max } else { s.threshold + step * j as f64 })
        .collect();
    let ys = xs
        .iter()
        .map(|&x| match s.above {
            AbovePolicy::PinToOne => 1.0,
            AbovePolicy::RawRatio => ratio.content(ratio.axis().find_bin_clamped(x)),
        })
        .collect();
    (xs, ys)
}

/// Build the normalization-preserving weight curve `name` from a ratio
/// histogram and the (density) reference it was derived from.
pub fn smooth_weights(
    ratio: &Hist1D,
    reference: &Hist1D,
    settings: &SmootherSettings,
    name: &str,
) -> Result<Graph, AppError> {
    let t = settings.threshold;
    if !(t > 0.0 && t < settings.max) {
        return Err(AppError::consistency(format!(
            "Need 0 < threshold < max, got {t} and {}.",
            settings.max
        )));
    }

    let (fx, fy) = sample_fit_region(ratio, settings).map_err(|e| e.context(name))?;
    let (tx, ty) = sample_tail(ratio, settings);
    let fit = Graph::new("fit", fx, fy).map_err(|e| e.context(name))?;
    let tail = Graph::new("tail", tx, ty).map_err(|e| e.context(name))?;

    let (mut total, mut fixed, mut scaled) = (0.0, 0.0, 0.0);
    for i in 0..reference.n_bins() {
        let c = reference.axis().center(i);
        let r = reference.content(i) * reference.axis().width(i);
        total += r;
        if c <= t {
            scaled += r * fit.eval(c);
        } else {
            fixed += r * tail.eval(c);
        }
    }
    if !(total > 0.0) {
        return Err(AppError::numerical(format!(
            "{name}: reference '{}' has non-positive integral {total}.",
            reference.name()
        )));
    }
    if !(scaled > 0.0) {
        return Err(AppError::numerical(format!(
            "{name}: weighted reference integral below threshold is {scaled}, cannot normalize."
        )));
    }
    let k = (total - fixed) / scaled;
    if !k.is_finite() {
        return Err(AppError::numerical(format!("{name}: normalization factor is not finite.")));
    }
    debug!(curve = name, k, norm = (scaled + fixed) / total, "normalization factor");

    let mut x = fit.x().to_vec();
    let mut y: Vec<f64> = fit.y().iter().map(|v| v * k).collect();
    x.extend_from_slice(tail.x());
    y.extend_from_slice(tail.y());
    if y.iter().any(|v| !v.is_finite()) {
        return Err(AppError::numerical(format!("{name}: non-finite weight sample.")));
    }
    Graph::new(name, x, y)
}
