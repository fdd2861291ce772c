//! CDCL SAT solver for bvgraph
//!
//! Literals are dense `u32` encodings over variables starting at 0. The
//! solver is incremental: clauses may be added between solve calls and
//! each call may carry its own assumptions.
//!
//! # Examples
//!
//! ```
//! use bvgraph_sat::{Lit, Solver, SolverResult};
//!
//! let mut solver = Solver::new();
//! let a = solver.new_var();
//! let b = solver.new_var();
//! solver.add_clause([Lit::pos(a), Lit::pos(b)]);
//! solver.add_clause([Lit::neg(a)]);
//!
//! assert_eq!(solver.solve(), SolverResult::Sat);
//! assert!(solver.model_value(Lit::pos(b)).is_true());
//!
//! assert_eq!(solver.solve_with_assumptions(&[Lit::neg(b)]), SolverResult::Unsat);
//! assert_eq!(solver.conflict(), &[Lit::pos(b)]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clause;
mod config;
pub mod dimacs;
pub mod invariants;
mod literal;
mod order;
mod restart;
mod solver;

pub use clause::{Clause, ClauseDatabase, ClauseId};
pub use config::SolverConfig;
pub use dimacs::{DimacsCnf, DimacsError};
pub use literal::{LBool, Lit, Var};
pub use order::VarOrder;
pub use restart::{luby, restart_interval};
pub use solver::{Solver, SolverResult, SolverStats};
