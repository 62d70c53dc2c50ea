//! Natural cubic spline (zero curvature at both ends).

use crate::error::AppError;
use crate::math::{check_knots, interval_index, Interpolant};

#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots.
    m: Vec<f64>,
}

impl CubicSpline {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, AppError> {
        check_knots(&xs, &ys, 2, "Cubic spline")?;
        let n = xs.len();
        let mut m = vec![0.0; n];
        if n > 2 {
            // Tridiagonal system for the interior curvatures (Thomas algorithm).
            let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
            let k = n - 2;
            let mut diag = vec![0.0; k];
            let mut rhs = vec![0.0; k];
            for j in 0..k {
                let i = j + 1;
                diag[j] = 2.0 * (h[i - 1] + h[i]);
                rhs[j] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
            }
            for j in 1..k {
                let w = h[j] / diag[j - 1];
                diag[j] -= w * h[j];
                rhs[j] -= w * rhs[j - 1];
            }
            m[k] = rhs[k - 1] / diag[k - 1];
            for j in (0..k - 1).rev() {
                m[j + 1] = (rhs[j] - h[j + 1] * m[j + 2]) / diag[j];
            }
        }
        if m.iter().any(|v| !v.is_finite()) {
            return Err(AppError::numerical("Cubic spline: non-finite curvature."));
        }
        Ok(Self { xs, ys, m })
    }
}

impl Interpolant for CubicSpline {
    fn eval(&self, x: f64) -> f64 {
        let i = interval_index(&self.xs, x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let h = x1 - x0;
        let (a, b) = (x1 - x, x - x0);
        let (m0, m1) = (self.m[i], self.m[i + 1]);
        m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (self.ys[i] / h - m0 * h / 6.0) * a
            + (self.ys[i + 1] / h - m1 * h / 6.0) * b
    }
}
