//! Per-tune input loading.
//!
//! Every tune (reference included) has its own container
//! `<input_dir>/xb_<TUNE>.json`. Loading reads each container once, keeps only
//! the requested observables and checks every tune's binning against the
//! reference so the builders can divide histograms without further checks.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::domain::{Observable, WeightConfig};
use crate::error::AppError;
use crate::hist::{Hist1D, Hist2D};
use crate::io::Container;

#[derive(Debug, Clone, PartialEq)]
pub enum InputHist {
    OneD(Hist1D),
    TwoD(Hist2D),
}

#[derive(Debug, Clone)]
pub struct TuneInputs {
    reference: String,
    tunes: Vec<String>,
    hists: BTreeMap<(String, Observable), InputHist>,
}

impl TuneInputs {
    /// Load `observables` for the reference and all configured tunes.
    ///
    /// Missing files, unreadable containers and missing objects are collected
    /// across all tunes and reported together in a single input error.
    pub fn load(input_dir: &Path, config: &WeightConfig, observables: &[Observable]) -> Result<Self, AppError> {
        let mut hists = BTreeMap::new();
        let mut missing = Vec::new();

        for tune in config.all_tunes() {
            let path = config.input_path(input_dir, tune);
            if !path.is_file() {
                missing.push(format!("file {}", path.display()));
                continue;
            }
            let container = match Container::open(&path) {
                Ok(c) => c,
                Err(e) => {
                    missing.push(format!("tune {tune}: {e}"));
                    continue;
                }
            };
            for &obs in observables {
                let obj_path = config.hist_path(obs);
                let loaded = match obs {
                    Observable::XbLeadB => container.get_hist1d(&obj_path).map(InputHist::OneD),
                    Observable::XbPtLeadB => container.get_hist2d(&obj_path).map(InputHist::TwoD),
                };
                match loaded {
                    Ok(h) => {
                        hists.insert((tune.to_string(), obs), h);
                    }
                    Err(e) => missing.push(format!("{}: {e}", path.display())),
                }
            }
            debug!(tune, path = %path.display(), "loaded inputs");
        }

        if !missing.is_empty() {
            return Err(AppError::input(format!(
                "Missing inputs ({}):\n  - {}",
                missing.len(),
                missing.join("\n  - ")
            )));
        }

        let inputs = Self {
            reference: config.reference.clone(),
            tunes: config.tunes.clone(),
            hists,
        };
        inputs.check_binning(observables)?;
        Ok(inputs)
    }

    fn check_binning(&self, observables: &[Observable]) -> Result<(), AppError> {
        for &obs in observables {
            for tune in &self.tunes {
                let same = match (self.get(&self.reference, obs), self.get(tune, obs)) {
                    (Some(InputHist::OneD(r)), Some(InputHist::OneD(t))) => r.axis().same_binning(t.axis()),
                    (Some(InputHist::TwoD(r)), Some(InputHist::TwoD(t))) => r.same_binning(t),
                    _ => false,
                };
                if !same {
                    return Err(AppError::input(format!(
                        "tune {tune}: binning of '{}' differs from reference {}.",
                        obs.hist_name(),
                        self.reference
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Configured tunes, reference excluded, in configured order.
    pub fn tunes(&self) -> &[String] {
        &self.tunes
    }

    pub fn get(&self, tune: &str, obs: Observable) -> Option<&InputHist> {
        self.hists.get(&(tune.to_string(), obs))
    }

    pub fn hist1d(&self, tune: &str, obs: Observable) -> Result<&Hist1D, AppError> {
        match self.get(tune, obs) {
            Some(InputHist::OneD(h)) => Ok(h),
            _ => Err(AppError::input(format!(
                "tune {tune}: no 1-D '{}' loaded.",
                obs.hist_name()
            ))),
        }
    }

    pub fn hist2d(&self, tune: &str, obs: Observable) -> Result<&Hist2D, AppError> {
        match self.get(tune, obs) {
            Some(InputHist::TwoD(h)) => Ok(h),
            _ => Err(AppError::input(format!(
                "tune {tune}: no 2-D '{}' loaded.",
                obs.hist_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hist::Axis;

    fn config() -> WeightConfig {
        WeightConfig {
            reference: "Ref".to_string(),
            tunes: vec!["A".to_string(), "B".to_string()],
            ..WeightConfig::default()
        }
    }

    fn write_tune(dir: &Path, tune: &str, bins: usize) {
        let h = Hist1D::from_counts("xb_lead_B", Axis::uniform(bins, 0.0, 1.5).unwrap(), vec![1.0; bins]).unwrap();
        let mut c = Container::new();
        c.put("bfragAnalysis/xb_lead_B", h).unwrap();
        c.write(&dir.join(format!("xb_{tune}.json"))).unwrap();
    }

    #[test]
    fn loads_all_tunes() {
        let dir = tempfile::tempdir().unwrap();
        for t in ["Ref", "A", "B"] {
            write_tune(dir.path(), t, 6);
        }
        let inputs = TuneInputs::load(dir.path(), &config(), &[Observable::XbLeadB]).unwrap();
        assert_eq!(inputs.tunes(), ["A", "B"]);
        assert_eq!(inputs.hist1d("B", Observable::XbLeadB).unwrap().n_bins(), 6);
        assert!(inputs.hist2d("B", Observable::XbPtLeadB).is_err());
    }

    #[test]
    fn every_missing_item_is_listed_once() {
        let dir = tempfile::tempdir().unwrap();
        write_tune(dir.path(), "Ref", 6);
        let err = TuneInputs::load(dir.path(), &config(), &[Observable::XbLeadB, Observable::XbPtLeadB])
            .unwrap_err();
        let msg = err.to_string();
        assert_eq!(err.exit_code(), 2);
        assert!(msg.contains("xb_A.json"));
        assert!(msg.contains("xb_B.json"));
        assert!(msg.contains("bfragAnalysis/xb_pt_lead_B"));
        assert!(msg.starts_with("Missing inputs (3)"));
    }

    #[test]
    fn unreadable_container_is_listed_with_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        write_tune(dir.path(), "Ref", 6);
        std::fs::write(dir.path().join("xb_A.json"), "not a container").unwrap();
        let err = TuneInputs::load(dir.path(), &config(), &[Observable::XbLeadB]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Missing inputs (2)"), "{msg}");
        assert!(msg.contains("tune A: Invalid container"));
        assert!(msg.contains("xb_B.json"));
    }

    #[test]
    fn binning_mismatch_names_the_tune() {
        let dir = tempfile::tempdir().unwrap();
        write_tune(dir.path(), "Ref", 6);
        write_tune(dir.path(), "A", 6);
        write_tune(dir.path(), "B", 5);
        let err = TuneInputs::load(dir.path(), &config(), &[Observable::XbLeadB]).unwrap_err();
        assert!(err.to_string().contains("tune B"));
    }
}
