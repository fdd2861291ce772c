//! Bitvector theory
//!
//! Fixed-width unsigned bitvectors, bit-blasted eagerly into the SAT solver.
//!
//! # Modules
//!
//! - **comparison**: comparison operators and their algebra
//! - **solver**: bitvector storage, circuits and comparison atoms

mod comparison;
mod solver;

pub use comparison::Comparison;
pub use solver::{BvId, BvTheory, BvVar, MAX_WIDTH, max_value, model_value};
