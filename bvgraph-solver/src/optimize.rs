//! Lexicographic minimisation of bitvectors by repeated solving

use bvgraph_core::{Error, Result};
use bvgraph_sat::{LBool, Lit};
use bvgraph_theories::{BvId, Comparison};
use tracing::debug;

use crate::context::{Context, SolveResult};

impl Context {
    /// Solve, then minimise `objectives` in order of priority.
    ///
    /// Each objective is tightened by solving under `bv < best` until that
    /// is unsatisfiable, then pinned with `bv <= best` while the next one is
    /// minimised. Resource limits apply to the whole run; if they stop a
    /// step, the best model found so far is kept and
    /// [`Context::last_solution_was_optimal`] returns false.
    pub fn solve_minimize(&mut self, assumptions: &[Lit], objectives: &[BvId]) -> Result<SolveResult> {
        for &id in objectives {
            self.bv_width(id)?;
        }
        let budget = self.limited_budget();
        let first = self.search(assumptions, budget)?;
        if first != SolveResult::Sat {
            return Ok(first);
        }

        let mut pinned = assumptions.to_vec();
        let mut best_model = self.take_model();
        let mut optimal = true;

        'objectives: for &id in objectives {
            let mut best = self.value_in(best_model.as_deref(), id)?;
            loop {
                if best == 0 {
                    break;
                }
                let below = self.bv_compare_const(Comparison::Lt, id, best)?;
                let mut step = pinned.clone();
                step.push(below);
                match self.search(&step, budget)? {
                    SolveResult::Sat => {
                        best_model = self.take_model();
                        best = self.value_in(best_model.as_deref(), id)?;
                        debug!(bv = %id, value = best, "improved objective");
                    }
                    SolveResult::Unsat => break,
                    SolveResult::Unknown => {
                        optimal = false;
                        break 'objectives;
                    }
                }
            }
            pinned.push(self.bv_compare_const(Comparison::Leq, id, best)?);
        }

        if let Some(model) = best_model {
            self.restore_model(model);
        }
        self.set_optimal(optimal);
        Ok(SolveResult::Sat)
    }

    fn value_in(&self, model: Option<&[LBool]>, id: BvId) -> Result<u64> {
        self.bv_model_value(model.ok_or(Error::NoModel)?, id)
    }
}
