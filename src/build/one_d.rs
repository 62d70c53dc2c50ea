//! 1-D fragmentation weights: one `x_b` weight curve per tune.

use rayon::prelude::*;
use tracing::info;

use crate::build::{derive_weights, smoothed_density};
use crate::domain::{frag_name, frag_smooth_name, Observable, WeightConfig};
use crate::error::AppError;
use crate::hist::Graph;
use crate::io::{Container, TuneInputs};

pub const WEIGHTS_1D_FILE: &str = "bfragweights.json";

#[derive(Debug, Clone)]
pub struct TuneWeights1D {
    pub tune: String,
    /// Unsmoothed density ratio at the bin centres.
    pub raw: Graph,
    /// Smoothed, normalization-preserving weight curve.
    pub smooth: Graph,
}

#[derive(Debug, Clone)]
pub struct Weights1D {
    pub reference: String,
    pub tunes: Vec<TuneWeights1D>,
}

impl Weights1D {
    /// `frag<TUNE>` and `frag<TUNE>_smooth` at the container root.
    pub fn to_container(&self) -> Result<Container, AppError> {
        let mut c = Container::new();
        for t in &self.tunes {
            c.put(t.raw.name(), t.raw.clone())?;
            c.put(t.smooth.name(), t.smooth.clone())?;
        }
        Ok(c)
    }
}

/// Derive the x_b weights of every configured tune against the reference.
///
/// Tunes are processed in parallel; the result keeps the configured order.
pub fn build_1d(inputs: &TuneInputs, config: &WeightConfig) -> Result<Weights1D, AppError> {
    let obs = Observable::XbLeadB;
    let reference = inputs.reference();
    let ref_density = smoothed_density(inputs.hist1d(reference, obs)?, config, &format!("xb_{reference}"))
        .map_err(|e| e.context(format!("reference {reference}")))?;

    let tunes = inputs
        .tunes()
        .par_iter()
        .map(|tune| {
            let counts = inputs.hist1d(tune, obs)?;
            let w = derive_weights(counts, &ref_density, config, &frag_name(tune), &frag_smooth_name(tune))
                .map_err(|e| e.context(format!("tune {tune}")))?;
            info!(tune = %tune, points = w.smooth.len(), "built 1-D weights");
            Ok(TuneWeights1D {
                tune: tune.clone(),
                raw: w.raw,
                smooth: w.smooth,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Weights1D {
        reference: reference.to_string(),
        tunes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::toy::{write_toy_inputs, ToyOptions};

    fn small_config() -> WeightConfig {
        WeightConfig {
            tunes: vec!["CP5BLup".to_string(), "CP5Peterson".to_string()],
            ..WeightConfig::default()
        }
    }

    #[test]
    fn builds_weights_in_configured_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config();
        write_toy_inputs(dir.path(), &config, &ToyOptions { events: 20_000, seed: 7 }).unwrap();
        let inputs = TuneInputs::load(dir.path(), &config, &[Observable::XbLeadB]).unwrap();
        let w = build_1d(&inputs, &config).unwrap();

        let names: Vec<&str> = w.tunes.iter().map(|t| t.smooth.name()).collect();
        assert_eq!(names, ["fragCP5BLup_smooth", "fragCP5Peterson_smooth"]);
        for t in &w.tunes {
            assert_eq!(t.smooth.eval(1.2), 1.0);
            assert!(t.smooth.y().iter().all(|v| v.is_finite()));
        }

        let c = w.to_container().unwrap();
        assert!(c.get_graph("fragCP5BLup").is_ok());
        assert!(c.get_graph("fragCP5Peterson_smooth").is_ok());
    }
}
