//! Point graph with linear evaluation.
//!
//! Weight curves are stored as graphs because downstream consumers need values
//! at arbitrary, non-bin-aligned x. Points are sorted by x. A repeated x is a
//! jump: evaluating exactly at it returns the left point, anything above it
//! interpolates from the right point onwards.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphRepr", into = "GraphRepr")]
pub struct Graph {
    name: String,
    x: Vec<f64>,
    y: Vec<f64>,
    ey: Option<Vec<f64>>,
}

#[derive(Serialize, Deserialize)]
struct GraphRepr {
    name: String,
    x: Vec<f64>,
    y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ey: Option<Vec<f64>>,
}

impl Graph {
    pub fn new(name: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self, AppError> {
        Self::build(name.into(), x, y, None)
    }

    pub fn with_errors(
        name: impl Into<String>,
        x: Vec<f64>,
        y: Vec<f64>,
        ey: Vec<f64>,
    ) -> Result<Self, AppError> {
        Self::build(name.into(), x, y, Some(ey))
    }

    fn build(name: String, x: Vec<f64>, y: Vec<f64>, ey: Option<Vec<f64>>) -> Result<Self, AppError> {
        if x.is_empty() {
            return Err(AppError::numerical(format!("Graph '{name}' has no points.")));
        }
        if x.len() != y.len() || ey.as_ref().is_some_and(|e| e.len() != x.len()) {
            return Err(AppError::input(format!(
                "Graph '{name}': x, y and error arrays differ in length."
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(AppError::numerical(format!(
                "Graph '{name}' contains non-finite points."
            )));
        }
        if x.windows(2).any(|w| w[1] < w[0]) {
            return Err(AppError::input(format!(
                "Graph '{name}': x values must be sorted."
            )));
        }
        Ok(Self { name, x, y, ey })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn ey(&self) -> Option<&[f64]> {
        self.ey.as_deref()
    }

    /// Multiply all y values (and errors) by `factor`.
    pub fn scale_y(&mut self, factor: f64) {
        for v in &mut self.y {
            *v *= factor;
        }
        if let Some(ey) = &mut self.ey {
            for e in ey {
                *e *= factor.abs();
            }
        }
    }

    /// Value of the first point at exactly `x`, without interpolation.
    pub fn value_at(&self, x: f64) -> Option<f64> {
        let j = self.x.partition_point(|&xi| xi < x);
        (j < self.x.len() && self.x[j] == x).then(|| self.y[j])
    }

    /// Evaluate by linear interpolation (linear extrapolation past the ends).
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();
        if n == 1 {
            return self.y[0];
        }
        let j = self.x.partition_point(|&xi| xi < x);
        if j < n && self.x[j] == x {
            return self.y[j];
        }
        let (lo, hi) = match j {
            0 => (0, 1),
            j if j == n => (n - 2, n - 1),
            j => (j - 1, j),
        };
        let dx = self.x[hi] - self.x[lo];
        if dx == 0.0 {
            return if j == 0 { self.y[lo] } else { self.y[hi] };
        }
        let t = (x - self.x[lo]) / dx;
        self.y[lo] + t * (self.y[hi] - self.y[lo])
    }
}

impl TryFrom<GraphRepr> for Graph {
    type Error = AppError;

    fn try_from(r: GraphRepr) -> Result<Self, Self::Error> {
        Graph::build(r.name, r.x, r.y, r.ey)
    }
}

impl From<Graph> for GraphRepr {
    fn from(g: Graph) -> Self {
        Self {
            name: g.name,
            x: g.x,
            y: g.y,
            ey: g.ey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_interpolates_and_extrapolates() {
        let g = Graph::new("g", vec![0.0, 1.0, 2.0], vec![0.0, 2.0, 2.0]).unwrap();
        assert_eq!(g.eval(0.5), 1.0);
        assert_eq!(g.eval(1.0), 2.0);
        assert_eq!(g.eval(1.7), 2.0);
        assert_eq!(g.eval(-1.0), -2.0);
        assert_eq!(g.eval(3.0), 2.0);
    }

    #[test]
    fn repeated_abscissa_is_a_left_continuous_jump() {
        let g = Graph::new("g", vec![0.0, 1.0, 1.0, 2.0], vec![3.0, 3.0, 1.0, 1.0]).unwrap();
        assert_eq!(g.eval(1.0), 3.0);
        assert_eq!(g.eval(1.0 + 1e-12), 1.0);
        assert_eq!(g.eval(0.999), 3.0);
        assert_eq!(g.eval(1.5), 1.0);
    }

    #[test]
    fn value_at_only_matches_existing_points() {
        let g = Graph::new("g", vec![0.0, 1.0, 1.0, 2.0], vec![3.0, 3.0, 1.0, 1.0]).unwrap();
        assert_eq!(g.value_at(1.0), Some(3.0));
        assert_eq!(g.value_at(2.0), Some(1.0));
        assert_eq!(g.value_at(1.5), None);
        assert_eq!(g.value_at(-1.0), None);
    }

    #[test]
    fn rejects_unsorted_or_non_finite_points() {
        assert!(Graph::new("g", vec![1.0, 0.0], vec![1.0, 1.0]).is_err());
        assert!(Graph::new("g", vec![0.0, 1.0], vec![1.0, f64::NAN]).is_err());
        assert!(Graph::new("g", vec![], vec![]).is_err());
    }
}
