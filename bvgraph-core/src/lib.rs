//! bvgraph Core - shared types for the bvgraph solver
//!
//! This crate holds what every other bvgraph crate agrees on:
//! - the [`Error`] type and [`Result`] alias
//! - [`ErrorContext`] for reporting errors with context at the CLI boundary
//! - the serde-backed [`Config`]
//!
//! # Examples
//!
//! ```
//! use bvgraph_core::{Config, Error};
//!
//! let config = Config::with_seed(1234);
//! assert_eq!(config.sat.random_seed, 1234);
//!
//! let err = Error::InvalidWidth { width: 65 };
//! assert!(err.to_string().contains("65"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod error_context;

pub use config::{Config, ResourceLimits, SatParams};
pub use error::{Error, Result};
pub use error_context::{ErrorContext, ResultExt};
