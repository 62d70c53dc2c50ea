//! Akima sub-spline.
//!
//! Shape-preserving piecewise cubic: the derivative at each knot is a weighted
//! mean of the neighbouring secant slopes, so an isolated outlier only bends
//! the two adjacent intervals and flat stretches stay flat (no overshoot).
//! End conditions follow the usual non-periodic convention: two virtual
//! secants are extrapolated linearly on each side.

use crate::error::AppError;
use crate::math::{check_knots, interval_index, Interpolant};

/// Akima needs two secants on each side of every knot.
pub const AKIMA_MIN_POINTS: usize = 5;

#[derive(Debug, Clone)]
pub struct AkimaSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Knot derivatives.
    t: Vec<f64>,
}

impl AkimaSpline {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, AppError> {
        check_knots(&xs, &ys, AKIMA_MIN_POINTS, "Akima interpolation")?;
        let n = xs.len();

        // m[k + 2] is the secant of interval k; two virtual slopes each side.
        let mut m = vec![0.0; n + 3];
        for k in 0..n - 1 {
            m[k + 2] = (ys[k + 1] - ys[k]) / (xs[k + 1] - xs[k]);
        }
        m[1] = 2.0 * m[2] - m[3];
        m[0] = 3.0 * m[2] - 2.0 * m[3];
        m[n + 1] = 2.0 * m[n] - m[n - 1];
        m[n + 2] = 3.0 * m[n] - 2.0 * m[n - 1];

        let t = (0..n)
            .map(|i| {
                let (m_2, m_1, m0, m1) = (m[i], m[i + 1], m[i + 2], m[i + 3]);
                let w_left = (m1 - m0).abs();
                let w_right = (m_1 - m_2).abs();
                let ne = w_left + w_right;
                if ne == 0.0 {
                    0.5 * (m_1 + m0)
                } else {
                    (w_left * m_1 + w_right * m0) / ne
                }
            })
            .collect();

        Ok(Self { xs, ys, t })
    }
}

impl Interpolant for AkimaSpline {
    fn eval(&self, x: f64) -> f64 {
        let i = interval_index(&self.xs, x);
        let h = self.xs[i + 1] - self.xs[i];
        let slope = (self.ys[i + 1] - self.ys[i]) / h;
        let (t0, t1) = (self.t[i], self.t[i + 1]);
        let c = (3.0 * slope - 2.0 * t0 - t1) / h;
        let e = (t0 + t1 - 2.0 * slope) / (h * h);
        let d = x - self.xs[i];
        self.ys[i] + d * (t0 + d * (c + d * e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_knots() {
        let xs = vec![0.0, 0.1, 0.3, 0.35, 0.7, 1.0];
        let ys = vec![1.2, 0.8, 1.1, 1.3, 0.9, 1.0];
        let s = AkimaSpline::new(xs.clone(), ys.clone()).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert!((s.eval(*x) - y).abs() < 1e-12);
        }
    }

    #[test]
    fn reproduces_straight_lines_exactly() {
        let xs: Vec<f64> = vec![0.0, 0.2, 0.25, 0.5, 0.9, 1.0];
        let ys: Vec<f64> = xs.iter().map(|x| 0.5 + 2.0 * x).collect();
        let s = AkimaSpline::new(xs, ys).unwrap();
        for &x in &[0.05, 0.33, 0.77, 0.95] {
            assert!((s.eval(x) - (0.5 + 2.0 * x)).abs() < 1e-12);
        }
    }

    #[test]
    fn flat_section_has_no_overshoot() {
        let xs = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let ys = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let s = AkimaSpline::new(xs, ys).unwrap();
        assert_eq!(s.eval(1.5), 0.0);
        assert_eq!(s.eval(4.5), 1.0);
        let mid = s.eval(2.5);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn needs_five_points() {
        assert!(AkimaSpline::new(vec![0.0, 1.0, 2.0, 3.0], vec![1.0; 4]).is_err());
        assert!(AkimaSpline::new(vec![0.0, 1.0, 1.0, 3.0, 4.0], vec![1.0; 5]).is_err());
    }
}
