//! Semileptonic branching-ratio weights.
//!
//! For each B-hadron species the semileptonic branching ratio is moved to the
//! edge of the measured uncertainty band. Jets with a semileptonic decay get
//! `br / br_py8`, all others `(1 - br) / (1 - br_py8)`, so the total yield is
//! unchanged. The weights are stored as graphs keyed by `+pdgId`
//! (semileptonic) and `-pdgId` (other decays).

use crate::domain::SemilepBr;
use crate::error::AppError;
use crate::hist::Graph;
use crate::io::Container;

pub const BR_WEIGHTS_FILE: &str = "bdecayweights.json";
pub const SEMILEP_UP: &str = "semilepbrup";
pub const SEMILEP_DOWN: &str = "semilepbrdown";

/// Per-species values used for the weights.
#[derive(Debug, Clone, PartialEq)]
pub struct BrRow {
    pub entry: SemilepBr,
    pub br_up: f64,
    pub br_down: f64,
}

/// Per-species yields from an analysis run: semileptonic decays to e/mu,
/// all semileptonic decays, and all decays. Index 0 holds the sum over
/// species.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorRow {
    pub pdg_id: i32,
    /// Per light-lepton flavour.
    pub br: f64,
    pub br_incl: f64,
    pub frac: f64,
    pub frac_incl: f64,
}

#[derive(Debug, Clone)]
pub struct BrWeights {
    pub up: Graph,
    pub down: Graph,
    pub rows: Vec<BrRow>,
}

impl BrWeights {
    pub fn to_container(&self) -> Result<Container, AppError> {
        let mut c = Container::new();
        c.put(SEMILEP_UP, self.up.clone())?;
        c.put(SEMILEP_DOWN, self.down.clone())?;
        Ok(c)
    }
}

pub fn br_up(b: &SemilepBr) -> f64 {
    b.py8_incl * (1.0 + (b.pdg + b.pdg_unc - b.py8_excl).max(0.0) / b.py8_excl)
}

pub fn br_down(b: &SemilepBr) -> f64 {
    b.py8_incl * (1.0 - (b.py8_excl - (b.pdg - b.pdg_unc)).max(0.0) / b.py8_excl)
}

fn weight_graph(name: &str, rows: &[BrRow], pick: impl Fn(&BrRow) -> f64) -> Result<Graph, AppError> {
    let mut points: Vec<(f64, f64)> = Vec::with_capacity(2 * rows.len());
    for row in rows {
        let pid = f64::from(row.entry.pdg_id.abs());
        let incl = row.entry.py8_incl;
        let br = pick(row);
        points.push((-pid, (1.0 - br) / (1.0 - incl)));
        points.push((pid, br / incl));
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (x, y) = points.into_iter().unzip();
    Graph::new(name, x, y)
}

pub fn build_br_weights(table: &[SemilepBr]) -> Result<BrWeights, AppError> {
    if table.is_empty() {
        return Err(AppError::consistency("Branching-ratio table is empty."));
    }
    let mut seen = Vec::with_capacity(table.len());
    for b in table {
        if seen.contains(&b.pdg_id.abs()) {
            return Err(AppError::consistency(format!("PDG id {} listed twice.", b.pdg_id)));
        }
        seen.push(b.pdg_id.abs());
        let valid = |v: f64| v.is_finite() && v > 0.0 && v < 1.0;
        if !(valid(b.py8_incl) && valid(b.py8_excl)) {
            return Err(AppError::consistency(format!(
                "{} ({}): Pythia branching ratios must lie in (0, 1).",
                b.name, b.pdg_id
            )));
        }
    }
    let rows: Vec<BrRow> = table
        .iter()
        .map(|b| BrRow {
            entry: b.clone(),
            br_up: br_up(b),
            br_down: br_down(b),
        })
        .collect();
    Ok(BrWeights {
        up: weight_graph(SEMILEP_UP, &rows, |r| r.br_up)?,
        down: weight_graph(SEMILEP_DOWN, &rows, |r| r.br_down)?,
        rows,
    })
}

/// Monitor yields: graphs `semilepbr`, `semilepbrinc` and `semilepbr_norm`
/// under `dir`, keyed by |pdgId| with 0 holding the total.
pub fn read_monitor(monitor: &Container, dir: &str, table: &[SemilepBr]) -> Result<Vec<MonitorRow>, AppError> {
    let path = |name: &str| if dir.is_empty() { name.to_string() } else { format!("{dir}/{name}") };
    let excl = monitor.get_graph(&path("semilepbr"))?;
    let incl = monitor.get_graph(&path("semilepbrinc"))?;
    let norm = monitor.get_graph(&path("semilepbr_norm"))?;
    let point = |g: &Graph, id: i32| {
        g.value_at(f64::from(id)).ok_or_else(|| {
            AppError::input(format!("Monitor graph '{}' has no point for pdgId {id}.", g.name()))
        })
    };
    let (excl_all, incl_all) = (point(&excl, 0)?, point(&incl, 0)?);

    let mut rows = Vec::with_capacity(table.len());
    for b in table {
        let id = b.pdg_id.abs();
        let (e, i, n) = (point(&excl, id)?, point(&incl, id)?, point(&norm, id)?);
        if !(n > 0.0 && excl_all > 0.0 && incl_all > 0.0) {
            return Err(AppError::numerical(format!(
                "{} ({}): empty monitor yields.",
                b.name, b.pdg_id
            )));
        }
        rows.push(MonitorRow {
            pdg_id: b.pdg_id,
            // Both light-lepton flavours are counted.
            br: e / n / 2.0,
            br_incl: i / n,
            frac: e / excl_all,
            frac_incl: i / incl_all,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::default_semilep_brs;

    #[test]
    fn weights_follow_shifted_branching_ratios() {
        let w = build_br_weights(&default_semilep_brs()).unwrap();
        let b0 = &w.rows[0];
        let expected_up = 0.23845 * (1.0 + (0.1033 + 0.0028 - 0.1043) / 0.1043);
        assert!((b0.br_up - expected_up).abs() < 1e-12);
        assert!((w.up.eval(511.0) - expected_up / 0.23845).abs() < 1e-12);
        assert!((w.up.eval(-511.0) - (1.0 - expected_up) / (1.0 - 0.23845)).abs() < 1e-12);
        // B+: PDG + uncertainty stays below Pythia, so "up" is no change.
        assert_eq!(w.up.eval(521.0), 1.0);
    }

    #[test]
    fn yields_are_conserved_per_species() {
        let w = build_br_weights(&default_semilep_brs()).unwrap();
        for row in &w.rows {
            let pid = f64::from(row.entry.pdg_id);
            let incl = row.entry.py8_incl;
            for g in [&w.up, &w.down] {
                let total = incl * g.eval(pid) + (1.0 - incl) * g.eval(-pid);
                assert!((total - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn graphs_are_sorted_by_signed_id() {
        let w = build_br_weights(&default_semilep_brs()).unwrap();
        assert_eq!(w.down.x(), &[-5122.0, -531.0, -521.0, -511.0, 511.0, 521.0, 531.0, 5122.0]);
    }

    #[test]
    fn monitor_rows_divide_by_norm() {
        let table = &default_semilep_brs()[..1];
        let mut c = Container::new();
        c.put("bfragAnalysis/semilepbr", Graph::new("semilepbr", vec![0.0, 511.0], vec![40.0, 20.0]).unwrap())
            .unwrap();
        c.put("bfragAnalysis/semilepbrinc", Graph::new("i", vec![0.0, 511.0], vec![100.0, 50.0]).unwrap())
            .unwrap();
        c.put("bfragAnalysis/semilepbr_norm", Graph::new("n", vec![0.0, 511.0], vec![400.0, 200.0]).unwrap())
            .unwrap();
        let rows = read_monitor(&c, "bfragAnalysis", table).unwrap();
        assert_eq!(rows[0].br, 0.05);
        assert_eq!(rows[0].br_incl, 0.25);
        assert_eq!(rows[0].frac, 0.5);
    }

    #[test]
    fn monitor_without_a_species_is_rejected() {
        let table = default_semilep_brs();
        let x = vec![0.0, 511.0, 531.0, 5122.0];
        let mut c = Container::new();
        for name in ["semilepbr", "semilepbrinc", "semilepbr_norm"] {
            c.put(&format!("bfragAnalysis/{name}"), Graph::new(name, x.clone(), vec![100.0, 40.0, 10.0, 10.0]).unwrap())
                .unwrap();
        }
        let err = read_monitor(&c, "bfragAnalysis", &table).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
        assert!(err.to_string().contains("pdgId 521"), "{err}");
    }
}
