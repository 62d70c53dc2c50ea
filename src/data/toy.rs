//! Toy input generation.
//!
//! Produces one input container per tune, shaped like the output of the
//! analysis job: the leading B-hadron x_b spectrum (`xb_lead_B`), the same vs
//! jet pT (`xb_pt_lead_B`) and the semileptonic-decay monitor graphs. Jet pT
//! follows a Pareto spectrum; x_b is drawn from the tune's fragmentation
//! function and smeared with a pT-dependent resolution, which populates the
//! region above 1 the way hadronization and clustering do.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, Pareto};
use rayon::prelude::*;
use tracing::info;

use crate::domain::{FragModel, Observable, SemilepBr, WeightConfig};
use crate::error::AppError;
use crate::hist::{Axis, Graph, Hist1D, Hist2D};
use crate::io::Container;

/// Jet-pT bin edges of the analysis histograms (GeV).
pub const PT_EDGES: [f64; 9] = [20.0, 40.0, 60.0, 100.0, 150.0, 200.0, 350.0, 500.0, 5000.0];

/// String-fragmentation parameters shared by all Bowler-Lund tunes.
const LUND_A: f64 = 0.68;
const LUND_B: f64 = 0.98;
const B_MASS: f64 = 4.78;

/// Relative production rates of B0, B+, Bs0 and Lambda_b.
const SPECIES_RATES: [f64; 4] = [0.4, 0.4, 0.1, 0.1];

const MAX_TRIES: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToyOptions {
    pub events: usize,
    pub seed: u64,
}

impl Default for ToyOptions {
    fn default() -> Self {
        Self {
            events: 200_000,
            seed: 42,
        }
    }
}

/// x_b edges: 0.02 steps to 0.4, 0.01 to 0.6, 0.005 to 1.0, then 1.05, 1.1, 1.5.
pub fn xb_axis() -> Result<Axis, AppError> {
    let mut milli: Vec<u32> = (0..400).step_by(20).collect();
    milli.extend((400..600).step_by(10));
    milli.extend((600..=1000).step_by(5));
    milli.extend([1050, 1100, 1500]);
    Axis::new(milli.into_iter().map(|m| f64::from(m) / 1000.0).collect())
}

pub fn pt_axis() -> Result<Axis, AppError> {
    Axis::new(PT_EDGES.to_vec())
}

impl FragModel {
    /// Unnormalized `ln f(z)` on `0 < z < 1`.
    pub fn ln_density(&self, z: f64) -> f64 {
        match *self {
            FragModel::Peterson { eps } => {
                let d = 1.0 - 1.0 / z - eps / (1.0 - z);
                -z.ln() - 2.0 * d.abs().ln()
            }
            FragModel::BowlerLund { r_b } => {
                let bm2 = LUND_B * B_MASS * B_MASS;
                -(1.0 + r_b * bm2) * z.ln() + LUND_A * (1.0 - z).ln() - bm2 / z
            }
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        let ok = match *self {
            FragModel::Peterson { eps } => eps.is_finite() && eps > 0.0,
            FragModel::BowlerLund { r_b } => r_b.is_finite() && r_b > 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(AppError::consistency(format!("Invalid fragmentation model {self:?}.")))
        }
    }
}

/// Rejection sampler for a fragmentation function with a uniform proposal.
struct FragSampler {
    model: FragModel,
    ln_max: f64,
}

impl FragSampler {
    fn new(model: FragModel) -> Result<Self, AppError> {
        model.validate()?;
        let n = 20_000;
        let ln_max = (1..n)
            .map(|i| model.ln_density(i as f64 / n as f64))
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        if !ln_max.is_finite() {
            return Err(AppError::numerical(format!("{model:?} has no finite maximum.")));
        }
        // Grid maximum can undershoot a sharp peak.
        Ok(Self {
            model,
            ln_max: ln_max + 0.1,
        })
    }

    fn sample(&self, rng: &mut StdRng) -> Result<f64, AppError> {
        for _ in 0..MAX_TRIES {
            let z = rng.gen_range(f64::EPSILON..1.0);
            let u: f64 = rng.r#gen();
            let ln_f = self.model.ln_density(z);
            if ln_f.is_finite() && u.ln() < ln_f - self.ln_max {
                return Ok(z);
            }
        }
        Err(AppError::numerical(format!(
            "{:?}: rejection sampling did not converge.",
            self.model
        )))
    }
}

fn tune_seed(seed: u64, tune: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    tune.hash(&mut hasher);
    hasher.finish()
}

struct Monitor {
    /// Index 0 sums over species.
    semilep: Vec<f64>,
    semilep_incl: Vec<f64>,
    all: Vec<f64>,
}

impl Monitor {
    fn new(n: usize) -> Self {
        Self {
            semilep: vec![0.0; n + 1],
            semilep_incl: vec![0.0; n + 1],
            all: vec![0.0; n + 1],
        }
    }

    fn graphs(&self, table: &[SemilepBr]) -> Result<[Graph; 3], AppError> {
        let x: Vec<f64> = std::iter::once(0.0)
            .chain(table.iter().map(|b| f64::from(b.pdg_id.abs())))
            .collect();
        let mut order: Vec<usize> = (0..x.len()).collect();
        order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));
        let pick = |v: &[f64]| order.iter().map(|&i| v[i]).collect::<Vec<f64>>();
        let xs = pick(&x);
        Ok([
            Graph::new("semilepbr", xs.clone(), pick(&self.semilep))?,
            Graph::new("semilepbrinc", xs.clone(), pick(&self.semilep_incl))?,
            Graph::new("semilepbr_norm", xs, pick(&self.all))?,
        ])
    }
}

/// Generate the input container of one tune.
pub fn generate_tune(
    tune: &str,
    model: &FragModel,
    config: &WeightConfig,
    options: &ToyOptions,
) -> Result<Container, AppError> {
    let sampler = FragSampler::new(model.clone()).map_err(|e| e.context(format!("tune {tune}")))?;
    let mut rng = StdRng::seed_from_u64(tune_seed(options.seed, tune));
    let pt_dist = Pareto::new(PT_EDGES[0], 2.5)
        .map_err(|e| AppError::numerical(format!("Jet pT distribution error: {e}")))?;
    let unit = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::numerical(format!("Smearing distribution error: {e}")))?;
    let table = &config.semilep_brs;
    let rates: Vec<f64> = SPECIES_RATES.iter().copied().take(table.len()).collect();
    let species = if rates.is_empty() {
        None
    } else {
        Some(WeightedIndex::new(&rates).map_err(|e| AppError::consistency(format!("Species rates: {e}")))?)
    };

    let xb_axis = xb_axis()?;
    let mut xb = Hist1D::new(Observable::XbLeadB.hist_name(), xb_axis.clone());
    let mut xb_pt = Hist2D::new(Observable::XbPtLeadB.hist_name(), xb_axis, pt_axis()?);
    let mut monitor = Monitor::new(table.len());

    for _ in 0..options.events {
        let pt: f64 = pt_dist.sample(&mut rng);
        let z = sampler.sample(&mut rng)?;
        let sigma = 0.02 + 0.8 / pt;
        let x = z * (1.0 + sigma * unit.sample(&mut rng));
        xb.fill(x, 1.0);
        xb_pt.fill(x, pt, 1.0);

        if let Some(species) = &species {
            let k = species.sample(&mut rng);
            let br = &table[k];
            let roll: f64 = rng.r#gen();
            for i in [0, k + 1] {
                monitor.all[i] += 1.0;
                if roll < br.py8_incl {
                    monitor.semilep_incl[i] += 1.0;
                }
                if roll < 2.0 * br.py8_excl {
                    monitor.semilep[i] += 1.0;
                }
            }
        }
    }

    let mut c = Container::new();
    c.put(&config.hist_path(Observable::XbLeadB), xb)?;
    c.put(&config.hist_path(Observable::XbPtLeadB), xb_pt)?;
    if !table.is_empty() {
        for g in monitor.graphs(table)? {
            c.put(&config.object_path(g.name()), g)?;
        }
    }
    Ok(c)
}

/// Write `xb_<TUNE>.json` for the reference and every configured tune.
pub fn write_toy_inputs(dir: &Path, config: &WeightConfig, options: &ToyOptions) -> Result<Vec<PathBuf>, AppError> {
    let tunes = config.all_tunes();
    let mut models = Vec::with_capacity(tunes.len());
    for tune in &tunes {
        let model = config.toy_models.get(*tune).ok_or_else(|| {
            AppError::consistency(format!("No toy fragmentation model configured for tune {tune}."))
        })?;
        models.push((*tune, model));
    }

    let containers = models
        .par_iter()
        .map(|(tune, model)| generate_tune(tune, model, config, options))
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut paths = Vec::with_capacity(tunes.len());
    for ((tune, _), mut container) in models.iter().zip(containers) {
        let path = config.input_path(dir, tune);
        container.write(&path)?;
        info!(tune = %tune, path = %path.display(), events = options.events, "wrote toy input");
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyzer_binning() {
        let x = xb_axis().unwrap();
        assert_eq!(x.n_bins(), 123);
        assert_eq!(x.max(), 1.5);
        assert!(x.edge_index(1.0).is_some());
        assert_eq!(pt_axis().unwrap().n_bins(), 8);
    }

    #[test]
    fn same_seed_same_sample() {
        let config = WeightConfig::default();
        let opts = ToyOptions { events: 2_000, seed: 3 };
        let model = FragModel::BowlerLund { r_b: 0.855 };
        let a = generate_tune("CP5BL", &model, &config, &opts).unwrap();
        let b = generate_tune("CP5BL", &model, &config, &opts).unwrap();
        assert_eq!(a, b);
        let c = generate_tune("CP5BLup", &model, &config, &opts).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn samples_peak_at_high_xb() {
        let config = WeightConfig::default();
        let opts = ToyOptions { events: 5_000, seed: 1 };
        for model in [FragModel::BowlerLund { r_b: 0.855 }, FragModel::Peterson { eps: 0.003271 }] {
            let c = generate_tune("T", &model, &config, &opts).unwrap();
            let h = c.get_hist1d("bfragAnalysis/xb_lead_B").unwrap();
            let above_half: f64 = (0..h.n_bins())
                .filter(|&i| h.axis().low_edge(i) >= 0.5)
                .map(|i| h.content(i))
                .sum();
            assert!(above_half > 0.7 * h.sum(), "{model:?}");
            let m = c.get_graph("bfragAnalysis/semilepbr_norm").unwrap();
            assert_eq!(m.eval(0.0), 5_000.0);
        }
    }

    #[test]
    fn missing_toy_model_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = WeightConfig {
            tunes: vec!["Unknown".to_string()],
            ..WeightConfig::default()
        };
        let err = write_toy_inputs(dir.path(), &config, &ToyOptions { events: 10, seed: 1 }).unwrap_err();
        assert!(err.to_string().contains("Unknown"));
    }
}
