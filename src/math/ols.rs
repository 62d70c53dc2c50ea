//! Weighted least squares solver.
//!
//! The tail fits solve small problems of the form:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! Rows are scaled by `sqrt(w_i)` and the resulting ordinary least squares
//! problem is solved through SVD, which copes with tall design matrices and
//! with nearly collinear columns (high polynomial degrees over short windows).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Weighted variant: scales row `i` of `x` and `y` by `sqrt(w[i])` first.
pub fn solve_weighted_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &[f64],
) -> Option<DVector<f64>> {
    if w.len() != x.nrows() || y.len() != x.nrows() {
        return None;
    }
    let mut xw = x.clone();
    let mut yw = y.clone();
    for (i, &wi) in w.iter().enumerate() {
        let sw = wi.max(0.0).sqrt();
        for j in 0..xw.ncols() {
            xw[(i, j)] *= sw;
        }
        yw[i] *= sw;
    }
    solve_least_squares(&xw, &yw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overdetermined_quadratic_is_recovered() {
        // y = 1 - x + 0.5 x^2 sampled at five points.
        let xs = [0.0, 0.5, 1.0, 1.5, 2.0];
        let mut rows = Vec::new();
        for &x in &xs {
            rows.extend([1.0, x, x * x]);
        }
        let x = DMatrix::from_row_slice(5, 3, &rows);
        let y = DVector::from_iterator(5, xs.iter().map(|x| 1.0 - x + 0.5 * x * x));

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-10);
        assert!((beta[1] + 1.0).abs() < 1e-10);
        assert!((beta[2] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn weights_pull_the_fit_towards_heavy_points() {
        // Constant fit to [0, 10]: weights 1:9 give 9.
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let y = DVector::from_row_slice(&[0.0, 10.0]);
        let beta = solve_weighted_least_squares(&x, &y, &[1.0, 9.0]).unwrap();
        assert!((beta[0] - 9.0).abs() < 1e-10);
    }
}
