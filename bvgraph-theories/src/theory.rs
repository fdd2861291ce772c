//! Theory interface for lazily checked theories
//!
//! A lazy theory inspects complete SAT models and answers with lemmas:
//! clauses the model falsifies and every theory-consistent assignment
//! satisfies. The solver adds them and searches again.

use crate::bv::BvTheory;
use bvgraph_core::Result;
use bvgraph_sat::{LBool, Lit, Solver as SatSolver};

/// A theory lemma (a clause)
pub type Lemma = Vec<Lit>;

/// Outcome of checking a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TheoryResult {
    /// The model is consistent with the theory
    Consistent,
    /// The model violates the theory; each lemma is falsified by it
    Lemmas(Vec<Lemma>),
}

impl TheoryResult {
    /// True if no lemma was produced
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent)
    }
}

/// What a theory may touch while checking: the SAT solver to allocate new
/// atoms in, and the bitvector theory to read weights and build comparisons.
#[derive(Debug)]
pub struct TheoryEnv<'a> {
    /// SAT solver
    pub sat: &'a mut SatSolver,
    /// Bitvector theory
    pub bv: &'a mut BvTheory,
}

/// A lazily checked theory
pub trait Theory {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Check a complete model
    fn check(&mut self, model: &[LBool], env: &mut TheoryEnv<'_>) -> Result<TheoryResult>;
}
