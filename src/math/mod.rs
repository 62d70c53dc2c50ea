//! Numerical building blocks: least squares, polynomial fits and splines.

pub mod akima;
pub mod cubic;
pub mod ols;
pub mod poly;

pub use akima::*;
pub use cubic::*;
pub use ols::*;
pub use poly::*;

/// A curve that can be evaluated anywhere inside its knot range.
pub trait Interpolant {
    fn eval(&self, x: f64) -> f64;

    /// `n + 1` uniform samples over `[lo, hi]` (both ends included).
    fn sample_uniform(&self, lo: f64, hi: f64, n: usize) -> (Vec<f64>, Vec<f64>) {
        let n = n.max(1);
        let step = (hi - lo) / n as f64;
        let xs: Vec<f64> = (0..=n)
            .map(|i| if i == n { hi } else { lo + step * i as f64 })
            .collect();
        let ys = xs.iter().map(|&x| self.eval(x)).collect();
        (xs, ys)
    }
}

/// Shared input validation: finite, strictly increasing knots.
pub(crate) fn check_knots(xs: &[f64], ys: &[f64], min_points: usize, what: &str) -> Result<(), crate::error::AppError> {
    use crate::error::AppError;

    if xs.len() != ys.len() {
        return Err(AppError::numerical(format!("{what}: x and y lengths differ.")));
    }
    if xs.len() < min_points {
        return Err(AppError::numerical(format!(
            "{what} needs at least {min_points} points, got {}.",
            xs.len()
        )));
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(AppError::numerical(format!("{what}: non-finite input point.")));
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(AppError::numerical(format!(
            "{what}: knots must be strictly increasing."
        )));
    }
    Ok(())
}

/// Index of the interval `[xs[i], xs[i+1]]` to use for `x` (end intervals extrapolate).
pub(crate) fn interval_index(xs: &[f64], x: f64) -> usize {
    let j = xs.partition_point(|&k| k <= x);
    j.saturating_sub(1).min(xs.len() - 2)
}
