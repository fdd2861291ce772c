//! Graph theory
//!
//! # Modules
//!
//! - **algorithms**: shortest paths, maximum flow and cycle detection on a
//!   fixed graph
//! - **theory**: predicates over switchable edges, checked on SAT models

pub mod algorithms;
mod theory;

pub use theory::{
    Bound, Edge, GraphId, GraphStats, GraphTheory, Metric, NodeId, Predicate, Weight,
};
