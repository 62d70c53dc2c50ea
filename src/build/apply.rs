//! Per-jet weight evaluation.
//!
//! A `WeightSet` bundles the built weight files and evaluates them for a
//! single jet: the fragmentation weights at the jet's x_b (and pT for the
//! surfaces) and the semileptonic branching-ratio weights for the leading
//! B hadron. Jets without a tagged B hadron get weight 1 throughout.

use std::collections::BTreeMap;
use std::path::Path;

use crate::build::{SEMILEP_DOWN, SEMILEP_UP, WEIGHTS_1D_FILE, WEIGHTS_2D_FILE, BR_WEIGHTS_FILE};
use crate::domain::{frag_smooth_name, SemilepBr};
use crate::error::AppError;
use crate::hist::{Graph, Hist2D};
use crate::io::Container;

/// Generator-level facts about one jet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JetInfo {
    pub pt: f64,
    pub xb: f64,
    /// PDG id of the leading tagged B hadron, 0 if none.
    pub lead_tag_id: i32,
    pub has_semilep_decay: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JetWeights {
    pub frag: Vec<(String, f64)>,
    pub frag_vs_pt: Vec<(String, f64)>,
    pub semilep_up: f64,
    pub semilep_down: f64,
}

#[derive(Debug, Clone, Default)]
pub struct WeightSet {
    frag: Vec<(String, Graph)>,
    surfaces: Vec<(String, Hist2D)>,
    /// `(up, down)` keyed by signed id: `+pid` semileptonic, `-pid` not.
    semilep: BTreeMap<i32, (f64, f64)>,
}

/// Cell content at `(x, y)`, clamped onto the surface.
pub fn surface_value(h: &Hist2D, x: f64, y: f64) -> f64 {
    h.content(h.x_axis().find_bin_clamped(x), h.y_axis().find_bin_clamped(y))
}

impl WeightSet {
    /// Smooth weights of `tunes` from the 1-D container, optionally the
    /// surfaces and the branching-ratio graphs.
    pub fn from_containers(
        weights_1d: &Container,
        weights_2d: Option<&Container>,
        br: Option<&Container>,
        tunes: &[String],
        br_table: &[SemilepBr],
    ) -> Result<Self, AppError> {
        let mut set = WeightSet::default();
        for tune in tunes {
            let name = frag_smooth_name(tune);
            set.frag.push((tune.clone(), weights_1d.get_graph(&name)?));
            if let Some(w2) = weights_2d {
                set.surfaces.push((tune.clone(), w2.get_hist2d(&name)?));
            }
        }
        if let Some(br) = br {
            let (up, down) = (br.get_graph(SEMILEP_UP)?, br.get_graph(SEMILEP_DOWN)?);
            let point = |g: &Graph, id: i32| {
                g.value_at(f64::from(id)).ok_or_else(|| {
                    AppError::input(format!("Graph '{}' has no point for pdgId {id}.", g.name()))
                })
            };
            for b in br_table {
                let pid = b.pdg_id.abs();
                for id in [-pid, pid] {
                    set.semilep.insert(id, (point(&up, id)?, point(&down, id)?));
                }
            }
        }
        Ok(set)
    }

    /// Load from a weights directory; the 2-D and branching-ratio files are
    /// used when present.
    pub fn load(dir: &Path, tunes: &[String], br_table: &[SemilepBr]) -> Result<Self, AppError> {
        let w1 = Container::open(&dir.join(WEIGHTS_1D_FILE))?;
        let optional = |file: &str| -> Result<Option<Container>, AppError> {
            let path = dir.join(file);
            if path.is_file() { Container::open(&path).map(Some) } else { Ok(None) }
        };
        let w2 = optional(WEIGHTS_2D_FILE)?;
        let br = optional(BR_WEIGHTS_FILE)?;
        Self::from_containers(&w1, w2.as_ref(), br.as_ref(), tunes, br_table)
    }

    pub fn has_surfaces(&self) -> bool {
        !self.surfaces.is_empty()
    }

    pub fn frag_weight(&self, tune: &str, xb: f64) -> Option<f64> {
        self.frag.iter().find(|(t, _)| t == tune).map(|(_, g)| g.eval(xb))
    }

    pub fn frag_weight_vs_pt(&self, tune: &str, xb: f64, pt: f64) -> Option<f64> {
        self.surfaces
            .iter()
            .find(|(t, _)| t == tune)
            .map(|(_, h)| surface_value(h, xb, pt))
    }

    /// `(up, down)` branching-ratio weights; 1 for species outside the table.
    pub fn semilep_weights(&self, lead_tag_id: i32, has_semilep_decay: bool) -> (f64, f64) {
        let abs_id = lead_tag_id.abs();
        let id = if has_semilep_decay { abs_id } else { -abs_id };
        self.semilep.get(&id).copied().unwrap_or((1.0, 1.0))
    }

    pub fn jet_weights(&self, jet: &JetInfo) -> JetWeights {
        let tagged = jet.lead_tag_id != 0;
        let frag = self
            .frag
            .iter()
            .map(|(t, g)| (t.clone(), if tagged { g.eval(jet.xb) } else { 1.0 }))
            .collect();
        let frag_vs_pt = self
            .surfaces
            .iter()
            .map(|(t, h)| {
                let w = if tagged { surface_value(h, jet.xb, jet.pt) } else { 1.0 };
                (t.clone(), w)
            })
            .collect();
        let (semilep_up, semilep_down) = self.semilep_weights(jet.lead_tag_id, jet.has_semilep_decay);
        JetWeights {
            frag,
            frag_vs_pt,
            semilep_up,
            semilep_down,
        }
    }
}
