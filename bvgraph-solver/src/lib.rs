//! bvgraph Solver - SAT modulo graphs and bitvectors
//!
//! [`Context`] ties a CDCL SAT solver to two theories:
//! - fixed-width unsigned bitvectors, bit-blasted into clauses as they are
//!   built;
//! - graph predicates (reachability, shortest-path distance, maximum flow,
//!   acyclicity) over edges switched by literals, checked on complete SAT
//!   models and refined with lemmas until the model is consistent.
//!
//! Edge weights and predicate bounds may be bitvectors, so graph structure
//! and arithmetic constrain each other.
//!
//! # Examples
//!
//! ```
//! use bvgraph_solver::{Comparison, Context};
//!
//! let mut ctx = Context::new();
//! let g = ctx.new_graph();
//! let n: Vec<_> = (0..3).map(|_| ctx.add_node(g).unwrap()).collect();
//! let short = ctx.new_bv(4).unwrap();
//! let long = ctx.new_bv(4).unwrap();
//! ctx.add_edge_bv(g, n[0], n[1], short).unwrap();
//! ctx.add_edge_bv(g, n[1], n[2], short).unwrap();
//! ctx.add_edge_bv(g, n[0], n[2], long).unwrap();
//!
//! // The direct edge must be at least 9, the whole trip at most 6
//! let heavy = ctx.bv_compare_const(Comparison::Geq, long, 9).unwrap();
//! ctx.assert_lit(heavy).unwrap();
//! let near = ctx.distance_leq(g, n[0], n[2], 6).unwrap();
//! ctx.assert_lit(near).unwrap();
//!
//! assert!(ctx.solve().unwrap());
//! assert!(ctx.bv_value(short).unwrap() <= 3);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
pub mod demo;
pub mod gnf;
mod optimize;

pub use bvgraph_core::{Config, Error, Result};
pub use bvgraph_sat::{Lit, Var};
pub use bvgraph_theories::{BvId, Comparison, GraphId, NodeId};
pub use context::{Context, SolveResult, Statistics, sat_config};
pub use demo::WeightsAdd;
pub use gnf::GnfProblem;
