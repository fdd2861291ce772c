//! Theories for bvgraph
//!
//! - [`bv`]: fixed-width unsigned bitvectors, bit-blasted eagerly
//! - [`graph`]: reachability, distance, maximum flow and acyclicity over
//!   graphs whose edges are switched by literals, checked lazily
//! - [`circuit`]: Tseitin gates with constant folding, shared by both
//!
//! Theories never own the SAT solver; they borrow it to allocate variables
//! and add clauses.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bv;
pub mod circuit;
pub mod graph;
pub mod theory;

pub use bv::{BvId, BvTheory, Comparison};
pub use circuit::Circuit;
pub use graph::{Bound, GraphId, GraphTheory, Metric, NodeId, Predicate, Weight};
pub use theory::{Lemma, Theory, TheoryEnv, TheoryResult};
