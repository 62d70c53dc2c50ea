//! Variable-width binned axis.
//!
//! Bin lookup follows the inclusive-left / exclusive-right convention:
//! `x` lies in bin `i` iff `edge[i] <= x < edge[i + 1]`. The upper edge of the
//! last bin is outside the axis. There are no under/overflow bins.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Absolute tolerance when matching a requested boundary against bin edges.
pub const EDGE_EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Axis {
    edges: Vec<f64>,
}

impl Axis {
    /// Build an axis from explicit edges (at least two, finite, strictly increasing).
    pub fn new(edges: Vec<f64>) -> Result<Self, AppError> {
        if edges.len() < 2 {
            return Err(AppError::consistency(format!(
                "An axis needs at least two bin edges, got {}.",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(AppError::consistency("Bin edges must be finite."));
        }
        if let Some(w) = edges.windows(2).find(|w| w[1] <= w[0]) {
            return Err(AppError::consistency(format!(
                "Bin edges must be strictly increasing (found {} followed by {}).",
                w[0], w[1]
            )));
        }
        Ok(Self { edges })
    }

    /// `n` equal-width bins on `[lo, hi)`.
    pub fn uniform(n: usize, lo: f64, hi: f64) -> Result<Self, AppError> {
        if n == 0 || !(lo.is_finite() && hi.is_finite()) || hi <= lo {
            return Err(AppError::consistency(format!(
                "Invalid uniform axis: n={n}, range=[{lo}, {hi})."
            )));
        }
        let step = (hi - lo) / n as f64;
        let mut edges: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
        edges.push(hi);
        Self::new(edges)
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn min(&self) -> f64 {
        self.edges[0]
    }

    pub fn max(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    pub fn low_edge(&self, bin: usize) -> f64 {
        self.edges[bin]
    }

    pub fn up_edge(&self, bin: usize) -> f64 {
        self.edges[bin + 1]
    }

    pub fn width(&self, bin: usize) -> f64 {
        self.edges[bin + 1] - self.edges[bin]
    }

    pub fn center(&self, bin: usize) -> f64 {
        0.5 * (self.edges[bin] + self.edges[bin + 1])
    }

    pub fn centers(&self) -> Vec<f64> {
        (0..self.n_bins()).map(|i| self.center(i)).collect()
    }

    /// Bin containing `x`, or `None` outside `[min, max)`.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !x.is_finite() || x < self.min() || x >= self.max() {
            return None;
        }
        Some(self.edges.partition_point(|&e| e <= x) - 1)
    }

    /// Like `find_bin`, but values outside the axis map to the first/last bin.
    pub fn find_bin_clamped(&self, x: f64) -> usize {
        if x < self.min() {
            0
        } else {
            self.find_bin(x).unwrap_or(self.n_bins() - 1)
        }
    }

    /// Index of the edge equal to `x` (within `EDGE_EPS`).
    pub fn edge_index(&self, x: f64) -> Option<usize> {
        let i = self.edges.partition_point(|&e| e < x - EDGE_EPS);
        match self.edges.get(i) {
            Some(&e) if (e - x).abs() <= EDGE_EPS => Some(i),
            _ => None,
        }
    }

    /// Resolve `[x_min, x_max]` to edge indices `(first, last)`.
    ///
    /// The bins covered are `first..last`; a bin whose lower edge equals
    /// `x_max` is not part of the range.
    pub fn edge_range(&self, x_min: f64, x_max: f64) -> Result<(usize, usize), AppError> {
        let first = self.edge_index(x_min).ok_or_else(|| {
            AppError::consistency(format!("Range start {x_min} is not a bin edge."))
        })?;
        let last = self.edge_index(x_max).ok_or_else(|| {
            AppError::consistency(format!("Range end {x_max} is not a bin edge."))
        })?;
        if last <= first {
            return Err(AppError::consistency(format!(
                "Empty range [{x_min}, {x_max}]."
            )));
        }
        Ok((first, last))
    }

    /// Same number of bins and edges equal within `EDGE_EPS`.
    pub fn same_binning(&self, other: &Axis) -> bool {
        self.edges.len() == other.edges.len()
            && self
                .edges
                .iter()
                .zip(other.edges.iter())
                .all(|(a, b)| (a - b).abs() <= EDGE_EPS)
    }
}

impl TryFrom<Vec<f64>> for Axis {
    type Error = AppError;

    fn try_from(edges: Vec<f64>) -> Result<Self, Self::Error> {
        Axis::new(edges)
    }
}

impl From<Axis> for Vec<f64> {
    fn from(axis: Axis) -> Self {
        axis.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis() -> Axis {
        Axis::new(vec![0.0, 0.5, 0.6, 1.0, 1.5]).unwrap()
    }

    #[test]
    fn rejects_non_increasing_edges() {
        assert!(Axis::new(vec![0.0, 1.0, 1.0]).is_err());
        assert!(Axis::new(vec![0.0]).is_err());
        assert!(Axis::new(vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn find_bin_is_inclusive_left_exclusive_right() {
        let a = axis();
        assert_eq!(a.find_bin(0.0), Some(0));
        assert_eq!(a.find_bin(0.5), Some(1));
        assert_eq!(a.find_bin(0.5999), Some(1));
        assert_eq!(a.find_bin(1.0), Some(3));
        assert_eq!(a.find_bin(1.5), None);
        assert_eq!(a.find_bin(-0.1), None);
        assert_eq!(a.find_bin_clamped(7.0), 3);
        assert_eq!(a.find_bin_clamped(-7.0), 0);
    }

    #[test]
    fn edge_range_excludes_bin_starting_at_upper_bound() {
        let a = axis();
        assert_eq!(a.edge_range(0.5, 1.0).unwrap(), (1, 3));
        assert_eq!(a.edge_range(0.0, 1.5).unwrap(), (0, 4));
        assert!(a.edge_range(0.55, 1.0).is_err());
        assert!(a.edge_range(1.0, 1.0).is_err());
        assert!(a.edge_range(1.0, 0.5).is_err());
    }

    #[test]
    fn uniform_axis_has_exact_end_edge() {
        let a = Axis::uniform(3, 0.0, 1.5).unwrap();
        assert_eq!(a.n_bins(), 3);
        assert_eq!(a.max(), 1.5);
        assert!((a.center(1) - 0.75).abs() < 1e-12);
    }
}
