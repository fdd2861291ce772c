//! SAT solver configuration

/// Parameters of the CDCL search
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// VSIDS variable activity decay
    pub var_decay: f64,
    /// Learnt clause activity decay
    pub clause_decay: f64,
    /// Probability of a random decision
    pub random_var_freq: f64,
    /// Seed for the random number generator
    pub random_seed: u64,
    /// Random initial phases instead of `false`
    pub random_initial_phase: bool,
    /// Base restart interval in conflicts
    pub restart_first: u64,
    /// Luby restarts (geometric otherwise)
    pub luby_restart: bool,
    /// Restart growth factor
    pub restart_inc: f64,
    /// Initial learnt clause limit relative to the number of problem clauses
    pub learntsize_factor: f64,
    /// Learnt clause limit growth
    pub learntsize_inc: f64,
    /// Phase saving
    pub phase_saving: bool,
}

impl Default for SolverConfig {
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
