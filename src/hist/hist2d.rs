//! Two-dimensional histogram (x = observable, y = jet pT).

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::hist::{Axis, Hist1D};

/// Row-major storage: bin `(ix, iy)` lives at `iy * nx + ix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Hist2DRepr", into = "Hist2DRepr")]
pub struct Hist2D {
    name: String,
    x: Axis,
    y: Axis,
    contents: Vec<f64>,
    errors: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct Hist2DRepr {
    name: String,
    x_edges: Axis,
    y_edges: Axis,
    contents: Vec<f64>,
    errors: Vec<f64>,
}

impl Hist2D {
    pub fn new(name: impl Into<String>, x: Axis, y: Axis) -> Self {
        let n = x.n_bins() * y.n_bins();
        Self {
            name: name.into(),
            x,
            y,
            contents: vec![0.0; n],
            errors: vec![0.0; n],
        }
    }

    pub fn from_parts(
        name: impl Into<String>,
        x: Axis,
        y: Axis,
        contents: Vec<f64>,
        errors: Vec<f64>,
    ) -> Result<Self, AppError> {
        let name = name.into();
        let n = x.n_bins() * y.n_bins();
        if contents.len() != n || errors.len() != n {
            return Err(AppError::input(format!(
                "Histogram '{name}': {n} cells but {} contents / {} errors.",
                contents.len(),
                errors.len()
            )));
        }
        Ok(Self {
            name,
            x,
            y,
            contents,
            errors,
        })
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

    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    pub fn y_axis(&self) -> &Axis {
        &self.y
    }

    fn idx(&self, ix: usize, iy: usize) -> usize {
        iy * self.x.n_bins() + ix
    }

    pub fn content(&self, ix: usize, iy: usize) -> f64 {
        self.contents[self.idx(ix, iy)]
    }

    pub fn error(&self, ix: usize, iy: usize) -> f64 {
        self.errors[self.idx(ix, iy)]
    }

    pub fn set_bin(&mut self, ix: usize, iy: usize, content: f64, error: f64) {
        let i = self.idx(ix, iy);
        self.contents[i] = content;
        self.errors[i] = error;
    }

    pub fn fill(&mut self, x: f64, y: f64, w: f64) -> bool {
        let (Some(ix), Some(iy)) = (self.x.find_bin(x), self.y.find_bin(y)) else {
            return false;
        };
        let i = self.idx(ix, iy);
        self.contents[i] += w;
        self.errors[i] = self.errors[i].hypot(w);
        true
    }

    pub fn sum(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// Multiply every cell of row `iy` by `factor`.
    pub fn scale_row(&mut self, iy: usize, factor: f64) {
        let nx = self.x.n_bins();
        let start = iy * nx;
        for i in start..start + nx {
            self.contents[i] *= factor;
            self.errors[i] *= factor.abs();
        }
    }

    /// Project y-bins `iy_first..iy_end` onto x (errors in quadrature).
    pub fn project_x_bins(&self, name: impl Into<String>, iy_first: usize, iy_end: usize) -> Hist1D {
        let mut out = Hist1D::new(name, self.x.clone());
        for ix in 0..self.x.n_bins() {
            let mut c = 0.0;
            let mut e2 = 0.0;
            for iy in iy_first..iy_end.min(self.y.n_bins()) {
                c += self.content(ix, iy);
                e2 += self.error(ix, iy).powi(2);
            }
            out.set_bin(ix, c, e2.sqrt());
        }
        out
    }

    /// Project the y-range `[y_min, y_max)` onto x; `None` as upper bound
    /// means "up to the last edge". Both bounds must be y bin edges.
    pub fn project_x_range(
        &self,
        name: impl Into<String>,
        y_min: f64,
        y_max: Option<f64>,
    ) -> Result<Hist1D, AppError> {
        let (first, last) = self.y.edge_range(y_min, y_max.unwrap_or(self.y.max()))?;
        Ok(self.project_x_bins(name, first, last))
    }

    /// Full projection onto x.
    pub fn project_x(&self, name: impl Into<String>) -> Hist1D {
        self.project_x_bins(name, 0, self.y.n_bins())
    }

    /// Full projection onto y.
    pub fn project_y(&self, name: impl Into<String>) -> Hist1D {
        let mut out = Hist1D::new(name, self.y.clone());
        for iy in 0..self.y.n_bins() {
            let mut c = 0.0;
            let mut e2 = 0.0;
            for ix in 0..self.x.n_bins() {
                c += self.content(ix, iy);
                e2 += self.error(ix, iy).powi(2);
            }
            out.set_bin(iy, c, e2.sqrt());
        }
        out
    }

    pub fn same_binning(&self, other: &Hist2D) -> bool {
        self.x.same_binning(&other.x) && self.y.same_binning(&other.y)
    }
}

impl TryFrom<Hist2DRepr> for Hist2D {
    type Error = AppError;

    fn try_from(r: Hist2DRepr) -> Result<Self, Self::Error> {
        Hist2D::from_parts(r.name, r.x_edges, r.y_edges, r.contents, r.errors)
    }
}

impl From<Hist2D> for Hist2DRepr {
    fn from(h: Hist2D) -> Self {
        Self {
            name: h.name,
            x_edges: h.x,
            y_edges: h.y,
            contents: h.contents,
            errors: h.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Hist2D {
        let x = Axis::new(vec![0.0, 0.5, 1.0]).unwrap();
        let y = Axis::new(vec![20.0, 40.0, 60.0, 100.0]).unwrap();
        let mut h = Hist2D::new("h", x, y);
        h.fill(0.1, 30.0, 1.0);
        h.fill(0.7, 30.0, 2.0);
        h.fill(0.7, 50.0, 3.0);
        h.fill(0.2, 80.0, 4.0);
        h
    }

    #[test]
    fn projections_preserve_totals() {
        let h = grid();
        let px = h.project_x("px");
        let py = h.project_y("py");
        assert_eq!(px.contents(), &[5.0, 5.0]);
        assert_eq!(py.contents(), &[3.0, 3.0, 4.0]);
        assert_eq!(h.sum(), 10.0);
    }

    #[test]
    fn open_ended_range_projects_to_last_edge() {
        let h = grid();
        let p = h.project_x_range("p", 40.0, None).unwrap();
        assert_eq!(p.contents(), &[4.0, 3.0]);
        let p = h.project_x_range("p", 20.0, Some(40.0)).unwrap();
        assert_eq!(p.contents(), &[1.0, 2.0]);
        assert!(h.project_x_range("p", 30.0, None).is_err());
    }

    #[test]
    fn scale_row_touches_one_row_only() {
        let mut h = grid();
        h.scale_row(1, 2.0);
        assert_eq!(h.content(1, 1), 6.0);
        assert_eq!(h.content(1, 0), 2.0);
    }
}
