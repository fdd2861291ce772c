//! Result reporting in text and JSON

use bvgraph_solver::{SolveResult, Statistics};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for results
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// DIMACS-style lines (default)
    Text,
    /// A single JSON object
    Json,
}

impl OutputFormat {
    /// Parse a configuration file value
    pub fn from_config(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

/// Value of one bitvector, by file id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BvValue {
    /// Bitvector id in the input file.
    pub id: u32,
    /// Model value
    pub value: u64,
}

/// Everything reported about one solve
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Outcome
    pub result: SolveResult,
    /// Seed of the SAT search
    pub seed: u64,
    /// Bitvector values (satisfiable results only)
    pub bitvectors: Vec<BvValue>,
    /// Whether minimisation finished (present when minimising).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal: Option<bool>,
    /// Failed assumptions as negated DIMACS literals (unsatisfiable results only).
    pub conflict: Vec<i32>,
    /// Solver statistics
    pub stats: Statistics,
}

impl Report {
    /// Render in `format`; `with_stats` adds statistics comments to text.
    pub fn render(&self, format: OutputFormat, with_stats: bool) -> String {
        match format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
            }
            OutputFormat::Text => self.render_text(with_stats),
        }
    }

    fn render_text(&self, with_stats: bool) -> String {
        let mut out = format!("s {}\n", self.result);
        if self.optimal == Some(false) {
            out.push_str("c minimisation stopped at a resource limit\n");
        }
        for bv in &self.bitvectors {
            out.push_str(&format!("v bv{} = {}\n", bv.id, bv.value));
        }
        if !self.conflict.is_empty() {
            let lits: Vec<String> = self.conflict.iter().map(i32::to_string).collect();
            out.push_str(&format!("c conflict {} 0\n", lits.join(" ")));
        }
        if with_stats {
            let s = &self.stats;
            out.push_str(&format!("c seed {}\n", self.seed));
            out.push_str(&format!(
                "c solves {} theory rounds {} lemmas {}\n",
                s.solves, s.theory_rounds, s.theory_lemmas
            ));
            out.push_str(&format!(
                "c decisions {} propagations {} conflicts {} restarts {}\n",
                s.decisions, s.propagations, s.conflicts, s.restarts
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(result: SolveResult) -> Report {
        Report {
            result,
            seed: 3,
            bitvectors: vec![BvValue { id: 2, value: 9 }],
            optimal: None,
            conflict: Vec::new(),
            stats: Statistics::default(),
        }
    }

    #[test]
    fn test_text_output() {
        let text = report(SolveResult::Sat).render(OutputFormat::Text, false);
        assert_eq!(text, "s SATISFIABLE\nv bv2 = 9\n");
    }

    #[test]
    fn test_text_conflict_and_stats() {
        let mut r = report(SolveResult::Unsat);
        r.bitvectors.clear();
        r.conflict = vec![-1, 3];
        let text = r.render(OutputFormat::Text, true);
        assert!(text.starts_with("s UNSATISFIABLE\nc conflict -1 3 0\n"));
        assert!(text.contains("c seed 3"));
    }

    #[test]
    fn test_json_output() {
        let json = report(SolveResult::Sat).render(OutputFormat::Json, false);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["result"], "sat");
        assert_eq!(value["bitvectors"][0]["value"], 9);
        assert!(value.get("optimal").is_none());
    }

    #[test]
    fn test_format_from_config() {
        assert_eq!(OutputFormat::from_config("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_config("yaml"), None);
    }
}
