//! Run configuration.
//!
//! Every knob the weight derivation depends on lives here rather than in the
//! algorithms: tune list, reference tune, threshold, domain bound, slices and
//! their rebin factors. Defaults reproduce the production setup; a JSON file
//! passed with `--config` overrides any subset of fields.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{FragModel, Observable, PolyTails, PtSlice, RebinRule, SemilepBr, SmoothingStrategy};
use crate::error::AppError;

/// Default jet-pT slice boundaries (GeV); the last slice is open above.
pub const DEFAULT_PT_BOUNDS: [f64; 8] = [20.0, 40.0, 60.0, 100.0, 150.0, 200.0, 350.0, 500.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightConfig {
    /// Baseline tune all others are compared against.
    pub reference: String,
    /// Tunes to derive weights for, in output order.
    pub tunes: Vec<String>,
    /// Directory inside each input container holding the histograms.
    pub analysis_dir: String,

    /// Upper end `T` of the fit region `[0, T]`.
    pub threshold: f64,
    /// Upper end of the weight domain.
    pub max: f64,

    /// Smoothing passes applied to density histograms before taking ratios.
    pub smooth_repeat: usize,
    pub smooth_min: f64,
    pub smooth_max: f64,

    pub strategy: SmoothingStrategy,
    /// Number of uniform intervals sampled over `[0, T]`.
    pub fit_samples: usize,
    /// Number of uniform samples over `(T, max]`.
    pub tail_samples: usize,
    /// x bins of the 2-D weight surface over `[0, max]`.
    pub grid_bins: usize,
    pub poly: PolyTails,

    pub slices: Vec<PtSlice>,

    pub semilep_brs: Vec<SemilepBr>,
    pub toy_models: BTreeMap<String, FragModel>,
}

impl Default for WeightConfig {
    fn default() -> Self {
        let tunes = [
            "CP5BL",
            "CP5BLup",
            "CP5BLdown",
            "CP5Peterson",
            "CP5Petersonup",
            "CP5Petersondown",
            "CUETP8M2T4BL",
            "CUETP8M2T4BLLHC",
            "CUETP8M2T4BLLHCup",
            "CUETP8M2T4BLLHCdown",
        ];
        Self {
            reference: "CP5BLdefault".to_string(),
            tunes: tunes.iter().map(|t| t.to_string()).collect(),
            analysis_dir: "bfragAnalysis".to_string(),
            threshold: 1.0,
            max: 1.5,
            smooth_repeat: 2,
            smooth_min: 0.0,
            smooth_max: 1.0,
            strategy: SmoothingStrategy::AkimaSubspline,
            fit_samples: 500,
            tail_samples: 20,
            grid_bins: 1500,
            poly: PolyTails::default(),
            slices: default_slices(),
            semilep_brs: default_semilep_brs(),
            toy_models: default_toy_models(),
        }
    }
}

/// Production slices: statistics are thin at both pT ends, so the fine
/// `[0.6, 1.0]` region (80 bins of 0.005) is merged harder there.
pub fn default_slices() -> Vec<PtSlice> {
    let factors = [4, 2, 2, 1, 2, 2, 4, 8];
    let mut slices = PtSlice::from_boundaries(&DEFAULT_PT_BOUNDS);
    for (slice, factor) in slices.iter_mut().zip(factors) {
        slice.rebin.push(RebinRule {
            x_min: 0.6,
            x_max: 1.0,
            factor,
        });
    }
    if let Some(last) = slices.last_mut() {
        last.rebin.insert(
            0,
            RebinRule {
                x_min: 0.0,
                x_max: 0.4,
                factor: 2,
            },
        );
    }
    slices
}

pub fn default_semilep_brs() -> Vec<SemilepBr> {
    let rows = [
        (511, "B0", 0.23845, 0.1043, 0.1033, 0.0028),
        (521, "B+", 0.25579, 0.1129, 0.1099, 0.0028),
        (531, "Bs0", 0.21920, 0.0930, 0.0960, 0.008),
        (5122, "Lambdab", 0.17870, 0.0770, 0.109, 0.022),
    ];
    rows.iter()
        .map(|&(pdg_id, name, py8_incl, py8_excl, pdg, pdg_unc)| SemilepBr {
            pdg_id,
            name: name.to_string(),
            py8_incl,
            py8_excl,
            pdg,
            pdg_unc,
        })
        .collect()
}

pub fn default_toy_models() -> BTreeMap<String, FragModel> {
    let bl = |r_b: f64| FragModel::BowlerLund { r_b };
    let pe = |eps: f64| FragModel::Peterson { eps };
    BTreeMap::from([
        ("CP5BLdefault".to_string(), bl(0.855)),
        ("CP5BL".to_string(), bl(0.8949)),
        ("CP5BLup".to_string(), bl(1.079)),
        ("CP5BLdown".to_string(), bl(0.6981)),
        ("CP5Peterson".to_string(), pe(0.003271)),
        ("CP5Petersonup".to_string(), pe(0.00495)),
        ("CP5Petersondown".to_string(), pe(0.00212)),
        ("CUETP8M2T4BL".to_string(), bl(1.0)),
        ("CUETP8M2T4BLLHC".to_string(), bl(0.92)),
        ("CUETP8M2T4BLLHCup".to_string(), bl(1.05)),
        ("CUETP8M2T4BLLHCdown".to_string(), bl(0.79)),
    ])
}

impl WeightConfig {
    /// Defaults, optionally overridden by a JSON file. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let config = match path {
            None => Self::default(),
            Some(path) => {
                let file = File::open(path).map_err(|e| {
                    AppError::input(format!("Failed to open config '{}': {e}", path.display()))
                })?;
                serde_json::from_reader(file).map_err(|e| {
                    AppError::input(format!("Invalid config '{}': {e}", path.display()))
                })?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Static sanity checks. Binning-dependent checks (slice edges, rebin
    /// divisibility) happen once the reference histograms are loaded.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.reference.is_empty() {
            return Err(AppError::consistency("Reference tune name is empty."));
        }
        if self.tunes.is_empty() {
            return Err(AppError::consistency("No tunes configured."));
        }
        let mut seen = HashSet::new();
        for tune in &self.tunes {
            if tune.is_empty() || tune == &self.reference {
                return Err(AppError::consistency(format!(
                    "Tune '{tune}' must be non-empty and differ from the reference."
                )));
            }
            if !seen.insert(tune.as_str()) {
                return Err(AppError::consistency(format!("Tune '{tune}' listed twice.")));
            }
        }
        if !(self.threshold.is_finite() && self.max.is_finite() && 0.0 < self.threshold && self.threshold < self.max) {
            return Err(AppError::consistency(format!(
                "Need 0 < threshold < max, got threshold={} max={}.",
                self.threshold, self.max
            )));
        }
        if !(self.smooth_min < self.smooth_max) {
            return Err(AppError::consistency(format!(
                "Empty smoothing range [{}, {}].",
                self.smooth_min, self.smooth_max
            )));
        }
        if self.fit_samples < 2 || self.tail_samples < 1 || self.grid_bins < 1 {
            return Err(AppError::consistency(
                "fit_samples must be >= 2, tail_samples and grid_bins >= 1.",
            ));
        }
        if !(self.poly.low_max.is_finite() && self.poly.high_min < self.poly.high_max) {
            return Err(AppError::consistency("Invalid polynomial tail windows."));
        }
        self.validate_slices()
    }

    fn validate_slices(&self) -> Result<(), AppError> {
        let mut labels = HashSet::new();
        let mut prev_max: Option<f64> = None;
        for (i, slice) in self.slices.iter().enumerate() {
            let ctx = format!("slice '{}'", slice.label);
            if slice.label.is_empty() || !labels.insert(slice.label.as_str()) {
                return Err(AppError::consistency(format!("{ctx}: empty or duplicate label.")));
            }
            if let Some(hi) = slice.pt_max {
                if !(hi > slice.pt_min) {
                    return Err(AppError::consistency(format!("{ctx}: pt_max must exceed pt_min.")));
                }
            } else if i + 1 != self.slices.len() {
                return Err(AppError::consistency(format!(
                    "{ctx}: only the last slice may be open-ended."
                )));
            }
            if let Some(prev) = prev_max {
                if slice.pt_min < prev {
                    return Err(AppError::consistency(format!(
                        "{ctx}: slices must be ordered and non-overlapping."
                    )));
                }
            }
            prev_max = slice.pt_max;
            for rule in &slice.rebin {
                if rule.factor == 0 || !(rule.x_min < rule.x_max) {
                    return Err(AppError::consistency(format!(
                        "{ctx}: invalid rebin rule [{}, {}] x{}.",
                        rule.x_min, rule.x_max, rule.factor
                    )));
                }
            }
        }
        Ok(())
    }

    /// Input container for a tune.
    pub fn input_path(&self, dir: &Path, tune: &str) -> PathBuf {
        dir.join(format!("xb_{tune}.json"))
    }

    /// Path of an observable inside an input container.
    pub fn hist_path(&self, observable: Observable) -> String {
        self.object_path(observable.hist_name())
    }

    pub fn object_path(&self, name: &str) -> String {
        format!("{}/{name}", self.analysis_dir)
    }

    /// Reference first, then the configured tunes.
    pub fn all_tunes(&self) -> Vec<&str> {
        std::iter::once(self.reference.as_str())
            .chain(self.tunes.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = WeightConfig::default();
        c.validate().unwrap();
        assert_eq!(c.slices.len(), 8);
        assert_eq!(c.slices[7].label, "pT500");
        assert_eq!(c.all_tunes()[0], "CP5BLdefault");
        for tune in c.all_tunes() {
            assert!(c.toy_models.contains_key(tune), "missing toy model for {tune}");
        }
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let c: WeightConfig =
            serde_json::from_str(r#"{"reference":"A","tunes":["B","C"],"threshold":0.9}"#).unwrap();
        c.validate().unwrap();
        assert_eq!(c.threshold, 0.9);
        assert_eq!(c.max, 1.5);
        assert_eq!(c.tunes, vec!["B", "C"]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<WeightConfig>(r#"{"treshold":0.9}"#).is_err());
    }

    #[test]
    fn reference_in_tune_list_is_rejected() {
        let c = WeightConfig {
            tunes: vec!["CP5BLdefault".to_string()],
            ..WeightConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn threshold_must_sit_below_max() {
        let c = WeightConfig {
            threshold: 1.5,
            ..WeightConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn only_last_slice_may_be_open() {
        let mut c = WeightConfig::default();
        c.slices[2].pt_max = None;
        assert!(c.validate().is_err());
    }
}
