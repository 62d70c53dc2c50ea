//! Formatted terminal output.
//!
//! Formatting lives here so the builders only return data and output changes
//! stay in one file.

use crate::build::{BrWeights, ClosureRow, JetWeights, MonitorRow, NormFactors, Weights1D, Weights2D};
use crate::domain::WeightConfig;
use crate::hist::Graph;

fn header(out: &mut String, title: &str, config: &WeightConfig) {
    out.push_str(&format!("=== bfrag - {title} ===\n"));
    out.push_str(&format!("Reference: {}\n", config.reference));
    out.push_str(&format!(
        "Strategy: {} | T={} | max={} | smoothing x{} on [{}, {}]\n",
        config.strategy.display_name(),
        config.threshold,
        config.max,
        config.smooth_repeat,
        config.smooth_min,
        config.smooth_max
    ));
}

fn table_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn y_range(g: &Graph) -> (f64, f64) {
    g.y().iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn curve_header(out: &mut String, first: &str) {
    table_line(
        out,
        format!(
            "{first:<28} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9}",
            "points", "w(0.5)", "w(0.8)", "w(T)", "min", "max"
        ),
    );
    table_line(
        out,
        format!("{:-<28} {:-<6} {:-<9} {:-<9} {:-<9} {:-<9} {:-<9}", "", "", "", "", "", "", ""),
    );
}

fn curve_row(out: &mut String, label: &str, g: &Graph, threshold: f64) {
    let (lo, hi) = y_range(g);
    table_line(
        out,
        format!(
            "{:<28} {:>6} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4}",
            truncate(label, 28),
            g.len(),
            g.eval(0.5),
            g.eval(0.8),
            g.eval(threshold),
            lo,
            hi
        ),
    );
}

pub fn format_1d_summary(weights: &Weights1D, config: &WeightConfig) -> String {
    let mut out = String::new();
    header(&mut out, "fragmentation weights (1-D)", config);
    out.push('\n');
    curve_header(&mut out, "weight");
    for t in &weights.tunes {
        curve_row(&mut out, t.smooth.name(), &t.smooth, config.threshold);
    }
    out
}

pub fn format_2d_summary(weights: &Weights2D, config: &WeightConfig) -> String {
    let mut out = String::new();
    header(&mut out, "fragmentation weights vs jet pT", config);
    out.push_str(&format!(
        "Slices: {}\n",
        config.slices.iter().map(|s| s.label.as_str()).collect::<Vec<_>>().join(", ")
    ));
    for t in &weights.tunes {
        out.push('\n');
        curve_header(&mut out, &t.tune);
        for s in &t.slices {
            curve_row(&mut out, &s.label, &s.smooth, config.threshold);
        }
        curve_row(&mut out, "average", &t.avg_smooth, config.threshold);
    }
    out
}

pub fn format_norm_factors(factors: &[NormFactors]) -> String {
    let mut out = String::new();
    out.push_str("Normalization factors (reference / weighted):\n");
    table_line(&mut out, format!("{:<24} {:>10} {}", "tune", "1-D", "2-D per pT bin"));
    table_line(&mut out, format!("{:-<24} {:-<10} {:-<14}", "", "", ""));
    for f in factors {
        table_line(
            &mut out,
            format!("{:<24} {:>10.6} {}", truncate(&f.tune, 24), f.factor_1d, fmt_vec(&f.factors_2d)),
        );
    }
    out
}

pub fn format_closure(rows: &[ClosureRow]) -> String {
    let mut out = String::new();
    out.push_str("Closure (reference yield vs weighted yield):\n");
    table_line(&mut out, format!("{:<24} {:>14} {:>14} {:>10}", "tune", "norm", "weighted", "ratio"));
    table_line(&mut out, format!("{:-<24} {:-<14} {:-<14} {:-<10}", "", "", "", ""));
    for r in rows {
        table_line(
            &mut out,
            format!(
                "{:<24} {:>14.1} {:>14.1} {:>10.6}",
                truncate(&r.tune, 24),
                r.norm,
                r.weighted,
                r.norm / r.weighted
            ),
        );
    }
    out
}

/// Branching-ratio table; monitor columns are shown when available.
pub fn format_br_table(weights: &BrWeights, monitor: Option<&[MonitorRow]>) -> String {
    let mut out = String::new();
    table_line(
        &mut out,
        format!(
            "{:<6} {:<10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>9} {:>9} {:>8} {:>8}",
            "PDGID", "NAME", "PY8INC", "PY8EXCL", "PDG", "PDGUNC", "BRUP", "BRDOWN", "MONBRINC", "MONBR", "FRACINC", "FRAC"
        ),
    );
    for row in &weights.rows {
        let b = &row.entry;
        let mon = monitor
            .and_then(|m| m.iter().find(|r| r.pdg_id == b.pdg_id))
            .map(|m| {
                format!(
                    "{:>9.5} {:>9.5} {:>8.5} {:>8.5}",
                    m.br_incl, m.br, m.frac_incl, m.frac
                )
            })
            .unwrap_or_default();
        table_line(
            &mut out,
            format!(
                "{:<6} {:<10} {:>8} {:>8} {:>8} {:>8} {:>8.5} {:>8.5} {mon}",
                b.pdg_id,
                truncate(&b.name, 10),
                b.py8_incl,
                b.py8_excl,
                b.pdg,
                b.pdg_unc,
                row.br_up,
                row.br_down
            ),
        );
    }
    out
}

pub fn format_jet_weights(w: &JetWeights) -> String {
    let mut out = String::new();
    table_line(&mut out, format!("{:<24} {:>10} {:>10}", "tune", "frag", "frag(pT)"));
    table_line(&mut out, format!("{:-<24} {:-<10} {:-<10}", "", "", ""));
    for (tune, v) in &w.frag {
        let vs_pt = w
            .frag_vs_pt
            .iter()
            .find(|(t, _)| t == tune)
            .map(|(_, v)| format!("{v:>10.6}"))
            .unwrap_or_else(|| format!("{:>10}", "-"));
        table_line(&mut out, format!("{:<24} {v:>10.6} {vs_pt}", truncate(tune, 24)));
    }
    out.push_str(&format!(
        "semilepbr: up={:.6} down={:.6}\n",
        w.semilep_up, w.semilep_down
    ));
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_br_weights;
    use crate::domain::default_semilep_brs;

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("CP5BL", 10), "CP5BL");
        assert_eq!(truncate("CUETP8M2T4BLLHCdown", 8), "CUETP8M.");
    }

    #[test]
    fn br_table_lists_every_species() {
        let w = build_br_weights(&default_semilep_brs()).unwrap();
        let s = format_br_table(&w, None);
        assert_eq!(s.lines().count(), 5);
        assert!(s.lines().nth(1).is_some_and(|l| l.starts_with("511")));
        assert!(s.contains("Lambdab"));
    }

    #[test]
    fn norm_factor_rows() {
        let s = format_norm_factors(&[NormFactors {
            tune: "CP5BLup".to_string(),
            factor_1d: 1.0,
            factors_2d: vec![1.0, 0.5],
        }]);
        assert!(s.contains("CP5BLup"));
        assert!(s.contains("[1.000000, 0.500000]"));
    }
}
