//! Solver configuration
//!
//! Configuration is plain data so it can be loaded from a YAML/JSON file by
//! the command-line front end and handed to the solver context.

use serde::{Deserialize, Serialize};

/// Top-level solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SAT search parameters
    pub sat: SatParams,
    /// Resource limits applied to limited solves.
    pub limits: ResourceLimits,
    /// Maximum number of theory refinement rounds per solve (0 = unlimited).
    pub max_theory_rounds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sat: SatParams::default(),
            limits: ResourceLimits::default(),
            max_theory_rounds: 0,
        }
    }
}

impl Config {
    /// Configuration with the given random seed and defaults elsewhere.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        let mut config = Self::default();
        config.sat.random_seed = seed;
        config
    }
}

/// Parameters of the CDCL search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatParams {
    /// VSIDS variable activity decay
    pub var_decay: f64,
    /// Learnt clause activity decay
    pub clause_decay: f64,
    /// Probability of picking a random decision variable.
    pub random_var_freq: f64,
    /// Seed for random decisions and initial phases.
    pub random_seed: u64,
    /// Pick random initial phases instead of `false`.
    pub random_initial_phase: bool,
    /// Conflicts before the first restart (scaled by the Luby sequence).
    pub restart_first: u64,
    /// Use the Luby restart sequence (geometric otherwise).
    pub luby_restart: bool,
    /// Growth factor for geometric restarts
    pub restart_inc: f64,
    /// Initial learnt clause limit as a fraction of problem clauses.
    pub learntsize_factor: f64,
    /// Growth factor of the learnt clause limit.
    pub learntsize_inc: f64,
    /// Reuse the last assigned polarity of a variable.
    pub phase_saving: bool,
}

impl Default for SatParams {
    fn default() -> Self {
        Self {
            var_decay: 0.95,
            clause_decay: 0.999,
            random_var_freq: 0.0,
            random_seed: 91_648_253,
            random_initial_phase: false,
            restart_first: 100,
            luby_restart: true,
            restart_inc: 2.0,
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,
            phase_saving: true,
        }
    }
}

/// Resource limits; zero means unlimited
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Maximum number of conflicts
    pub conflicts: u64,
    /// Maximum number of propagations
    pub propagations: u64,
    /// Wall-clock limit in seconds
    pub time_secs: u64,
}

impl ResourceLimits {
    /// True if no limit is set.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.conflicts == 0 && self.propagations == 0 && self.time_secs == 0
    }
}
