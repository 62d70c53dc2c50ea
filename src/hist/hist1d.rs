//! One-dimensional histogram.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::hist::{Axis, Graph};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Hist1DRepr", into = "Hist1DRepr")]
pub struct Hist1D {
    name: String,
    axis: Axis,
    contents: Vec<f64>,
    errors: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct Hist1DRepr {
    name: String,
    edges: Axis,
    contents: Vec<f64>,
    errors: Vec<f64>,
}

impl Hist1D {
    /// Empty histogram on the given axis.
    pub fn new(name: impl Into<String>, axis: Axis) -> Self {
        let n = axis.n_bins();
        Self {
            name: name.into(),
            axis,
            contents: vec![0.0; n],
            errors: vec![0.0; n],
        }
    }

    pub fn from_parts(
        name: impl Into<String>,
        axis: Axis,
        contents: Vec<f64>,
        errors: Vec<f64>,
    ) -> Result<Self, AppError> {
        let name = name.into();
        if contents.len() != axis.n_bins() || errors.len() != axis.n_bins() {
            return Err(AppError::input(format!(
                "Histogram '{name}': {} bins but {} contents / {} errors.",
                axis.n_bins(),
                contents.len(),
                errors.len()
            )));
        }
        Ok(Self {
            name,
            axis,
            contents,
            errors,
        })
    }

    /// Histogram with Poisson-like errors (`sqrt(|content|)`).
    pub fn from_counts(name: impl Into<String>, axis: Axis, contents: Vec<f64>) -> Result<Self, AppError> {
        let errors = contents.iter().map(|c| c.abs().sqrt()).collect();
        Self::from_parts(name, axis, contents, errors)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clone under a new name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    pub fn n_bins(&self) -> usize {
        self.contents.len()
    }

    pub fn content(&self, bin: usize) -> f64 {
        self.contents[bin]
    }

    pub fn error(&self, bin: usize) -> f64 {
        self.errors[bin]
    }

    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    pub(crate) fn contents_mut(&mut self) -> &mut [f64] {
        &mut self.contents
    }

    pub fn set_bin(&mut self, bin: usize, content: f64, error: f64) {
        self.contents[bin] = content;
        self.errors[bin] = error;
    }

    /// Add weight `w` at `x`; returns `false` when `x` is outside the axis.
    pub fn fill(&mut self, x: f64, w: f64) -> bool {
        let Some(bin) = self.axis.find_bin(x) else {
            return false;
        };
        self.contents[bin] += w;
        self.errors[bin] = self.errors[bin].hypot(w);
        true
    }

    /// Plain sum of contents.
    pub fn sum(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// `Σ content × width`.
    pub fn integral(&self) -> f64 {
        self.contents
            .iter()
            .enumerate()
            .map(|(i, c)| c * self.axis.width(i))
            .sum()
    }

    pub fn scale(&mut self, factor: f64) {
        for (c, e) in self.contents.iter_mut().zip(self.errors.iter_mut()) {
            *c *= factor;
            *e *= factor.abs();
        }
    }

    /// Bin-by-bin ratio `self / denom` with uncorrelated error propagation.
    ///
    /// Bins where the denominator is zero get ratio 0 and error 0. The number of
    /// such bins is returned alongside the ratio.
    pub fn divide(&self, denom: &Hist1D, name: impl Into<String>) -> Result<(Hist1D, usize), AppError> {
        let name = name.into();
        if !self.axis.same_binning(&denom.axis) {
            return Err(AppError::input(format!(
                "Cannot divide '{}' by '{}': binning differs.",
                self.name, denom.name
            )));
        }
        let mut out = Hist1D::new(name, self.axis.clone());
        let mut zero_bins = 0;
        for i in 0..self.n_bins() {
            let (a, ea) = (self.contents[i], self.errors[i]);
            let (b, eb) = (denom.contents[i], denom.errors[i]);
            if b == 0.0 {
                zero_bins += 1;
                continue;
            }
            let r = a / b;
            let err = ((ea * b).powi(2) + (eb * a).powi(2)).sqrt() / (b * b);
            out.set_bin(i, r, err);
        }
        Ok((out, zero_bins))
    }

    /// Graph of `(bin centre, content)` with the bin errors as y-errors.
    pub fn to_graph(&self, name: impl Into<String>) -> Result<Graph, AppError> {
        Graph::with_errors(name, self.axis.centers(), self.contents.clone(), self.errors.clone())
    }
}

impl TryFrom<Hist1DRepr> for Hist1D {
    type Error = AppError;

    fn try_from(r: Hist1DRepr) -> Result<Self, Self::Error> {
        Hist1D::from_parts(r.name, r.edges, r.contents, r.errors)
    }
}

impl From<Hist1D> for Hist1DRepr {
    fn from(h: Hist1D) -> Self {
        Self {
            name: h.name,
            edges: h.axis,
            contents: h.contents,
            errors: h.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(contents: &[f64]) -> Hist1D {
        let axis = Axis::uniform(contents.len(), 0.0, contents.len() as f64).unwrap();
        Hist1D::from_counts("h", axis, contents.to_vec()).unwrap()
    }

    #[test]
    fn fill_accumulates_weights_and_errors() {
        let mut h = Hist1D::new("h", Axis::new(vec![0.0, 1.0, 2.0]).unwrap());
        assert!(h.fill(0.5, 2.0));
        assert!(h.fill(0.5, 1.0));
        assert!(!h.fill(2.0, 1.0));
        assert_eq!(h.content(0), 3.0);
        assert!((h.error(0) - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn integral_weights_by_width() {
        let axis = Axis::new(vec![0.0, 1.0, 3.0]).unwrap();
        let h = Hist1D::from_counts("h", axis, vec![1.0, 2.0]).unwrap();
        assert_eq!(h.sum(), 3.0);
        assert_eq!(h.integral(), 5.0);
    }

    #[test]
    fn divide_sets_zero_where_denominator_is_empty() {
        let num = hist(&[2.0, 4.0, 6.0]);
        let den = hist(&[1.0, 0.0, 3.0]);
        let (r, zeros) = num.divide(&den, "r").unwrap();
        assert_eq!(zeros, 1);
        assert_eq!(r.contents(), &[2.0, 0.0, 2.0]);
        assert_eq!(r.name(), "r");
    }

    #[test]
    fn divide_rejects_mismatched_binning() {
        let num = hist(&[1.0, 1.0]);
        let den = hist(&[1.0, 1.0, 1.0]);
        assert!(num.divide(&den, "r").is_err());
    }

    #[test]
    fn deserialize_checks_bin_count() {
        let bad = r#"{"name":"h","edges":[0.0,1.0,2.0],"contents":[1.0],"errors":[1.0]}"#;
        assert!(serde_json::from_str::<Hist1D>(bad).is_err());
        let good = r#"{"name":"h","edges":[0.0,1.0,2.0],"contents":[1.0,2.0],"errors":[1.0,1.0]}"#;
        let h: Hist1D = serde_json::from_str(good).unwrap();
        assert_eq!(h.n_bins(), 2);
    }
}
