//! Property-based tests for the SAT solver

mod cdcl_properties;
