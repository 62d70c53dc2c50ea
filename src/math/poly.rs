//! Weighted polynomial least-squares fits.
//!
//! Abscissae are mapped onto `[-1, 1]` before building the Vandermonde matrix;
//! the raw `x` powers are badly conditioned for cubic fits over short windows.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::solve_weighted_least_squares;

#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// Coefficients in the scaled variable `u = (x - center) / half_range`.
    coeffs: Vec<f64>,
    center: f64,
    half_range: f64,
}

impl Polynomial {
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn eval(&self, x: f64) -> f64 {
        let u = (x - self.center) / self.half_range;
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * u + c)
    }
}

/// Fit a degree-`degree` polynomial to `(xs, ys)` with per-point weights.
pub fn fit_polynomial(xs: &[f64], ys: &[f64], weights: &[f64], degree: usize) -> Result<Polynomial, AppError> {
    let n = xs.len();
    if ys.len() != n || weights.len() != n {
        return Err(AppError::numerical("Polynomial fit: input lengths differ."));
    }
    if n < degree + 1 {
        return Err(AppError::numerical(format!(
            "Polynomial fit of degree {degree} needs at least {} points, got {n}.",
            degree + 1
        )));
    }

    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let center = 0.5 * (lo + hi);
    let half_range = 0.5 * (hi - lo);
    let half_range = if half_range > 0.0 {
        half_range
    } else if degree == 0 {
        1.0
    } else {
        return Err(AppError::numerical(
            "Polynomial fit: all points share the same x.",
        ));
    };

    let mut design = DMatrix::<f64>::zeros(n, degree + 1);
    for (i, &x) in xs.iter().enumerate() {
        let u = (x - center) / half_range;
        let mut p = 1.0;
        for j in 0..=degree {
            design[(i, j)] = p;
            p *= u;
        }
    }
    let y = DVector::from_column_slice(ys);

    let beta = solve_weighted_least_squares(&design, &y, weights)
        .ok_or_else(|| AppError::numerical("Polynomial fit: singular least-squares system."))?;

    Ok(Polynomial {
        coeffs: beta.iter().copied().collect(),
        center,
        half_range,
    })
}
