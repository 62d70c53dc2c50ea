//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can
//! be read from configuration files and echoed back by `bfrag config`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Histograms every per-tune input container must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Observable {
    /// Leading B-hadron momentum fraction, 1-D.
    XbLeadB,
    /// Leading B-hadron momentum fraction vs jet pT, 2-D.
    XbPtLeadB,
}

impl Observable {
    /// Object name inside the analysis directory.
    pub fn hist_name(self) -> &'static str {
        match self {
            Observable::XbLeadB => "xb_lead_B",
            Observable::XbPtLeadB => "xb_pt_lead_B",
        }
    }
}

/// How the fit region `[0, T]` of a weight curve is interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingStrategy {
    /// Polynomial fits on both tails, natural cubic spline through the result.
    #[serde(rename = "poly")]
    #[value(name = "poly")]
    PolynomialSpline,
    /// Shape-preserving Akima sub-spline through the raw points.
    #[serde(rename = "akima")]
    #[value(name = "akima")]
    AkimaSubspline,
}

impl SmoothingStrategy {
    pub fn display_name(self) -> &'static str {
        match self {
            SmoothingStrategy::PolynomialSpline => "polynomial+spline",
            SmoothingStrategy::AkimaSubspline => "akima",
        }
    }
}

/// Weight values above the threshold `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbovePolicy {
    /// Exactly 1 (no reweighting in the poorly populated tail).
    PinToOne,
    /// The ratio histogram's own bin content.
    RawRatio,
}

/// Merge `factor` adjacent x-bins inside `[x_min, x_max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebinRule {
    pub x_min: f64,
    pub x_max: f64,
    pub factor: usize,
}

/// A jet-pT range `[pt_min, pt_max)`; `pt_max = None` is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtSlice {
    pub label: String,
    pub pt_min: f64,
    #[serde(default)]
    pub pt_max: Option<f64>,
    #[serde(default)]
    pub rebin: Vec<RebinRule>,
}

impl PtSlice {
    /// Inclusive-left / exclusive-right membership.
    pub fn contains(&self, pt: f64) -> bool {
        pt >= self.pt_min && self.pt_max.is_none_or(|hi| pt < hi)
    }

    /// Slices from consecutive boundaries; the last one is open above.
    ///
    /// Labels follow `pT<lo>To<hi>` and `pT<lo>`.
    pub fn from_boundaries(bounds: &[f64]) -> Vec<PtSlice> {
        let mut out: Vec<PtSlice> = bounds
            .windows(2)
            .map(|w| PtSlice {
                label: format!("pT{}To{}", w[0], w[1]),
                pt_min: w[0],
                pt_max: Some(w[1]),
                rebin: Vec::new(),
            })
            .collect();
        if let Some(&last) = bounds.last() {
            out.push(PtSlice {
                label: format!("pT{last}"),
                pt_min: last,
                pt_max: None,
                rebin: Vec::new(),
            });
        }
        out
    }
}

/// Polynomial tail windows for `SmoothingStrategy::PolynomialSpline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolyTails {
    /// Points with `x < low_max` are replaced by the low-tail fit.
    pub low_max: f64,
    /// Points with `high_min < x < high_max` are replaced by the high-tail fit.
    pub high_min: f64,
    pub high_max: f64,
    pub degree: usize,
}

impl Default for PolyTails {
    fn default() -> Self {
        Self {
            low_max: 0.6,
            high_min: 1.03,
            high_max: 2.0,
            degree: 3,
        }
    }
}

/// Semileptonic branching ratios for one B-hadron species.
///
/// `py8_incl` sums all lepton flavours (taus included), `py8_excl` and `pdg`
/// are per light-lepton flavour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemilepBr {
    pub pdg_id: i32,
    pub name: String,
    pub py8_incl: f64,
    pub py8_excl: f64,
    pub pdg: f64,
    pub pdg_unc: f64,
}

/// Toy fragmentation function used by `bfrag toy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FragModel {
    /// `f(z) ∝ 1 / (z (1 - 1/z - ε/(1-z))²)`
    Peterson { eps: f64 },
    /// `f(z) ∝ z^-(1 + r_b b m_b²) (1-z)^a exp(-b m_T² / z)`
    BowlerLund { r_b: f64 },
}

/// Object name of the raw ratio graph/histogram for a tune.
pub fn frag_name(tune: &str) -> String {
    format!("frag{tune}")
}

/// Object name of the final smoothed weight for a tune.
pub fn frag_smooth_name(tune: &str) -> String {
    format!("frag{tune}_smooth")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_from_boundaries_end_open() {
        let s = PtSlice::from_boundaries(&[20.0, 40.0, 500.0]);
        let labels: Vec<&str> = s.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["pT20To40", "pT40To500", "pT500"]);
        assert_eq!(s[2].pt_max, None);
    }

    #[test]
    fn slice_membership_is_inclusive_left() {
        let s = PtSlice::from_boundaries(&[20.0, 40.0]);
        assert!(s[0].contains(20.0));
        assert!(!s[0].contains(40.0));
        assert!(s[1].contains(40.0));
        assert!(s[1].contains(1e6));
        assert!(!s[0].contains(19.999));
    }

    #[test]
    fn strategy_names_round_trip_through_serde() {
        let s: SmoothingStrategy = serde_json::from_str("\"poly\"").unwrap();
        assert_eq!(s, SmoothingStrategy::PolynomialSpline);
        assert_eq!(
            serde_json::to_string(&SmoothingStrategy::AkimaSubspline).unwrap(),
            "\"akima\""
        );
    }
}
