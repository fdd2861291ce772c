//! Error types for the bvgraph solver

use thiserror::Error;

/// Result type for bvgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the solver API, the theories and the input readers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bitvector width outside `1..=64`
    #[error("invalid bitvector width {width}: widths must be in 1..=64")]
    InvalidWidth {
        /// Requested width
        width: u32,
    },

    /// Constant that does not fit in the requested width.
    #[error("constant {value} does not fit in {width} bits")]
    ConstantOutOfRange {
        /// Constant value
        value: u64,
        /// Bitvector width
        width: u32,
    },

    /// Two bitvector operands with different widths.
    #[error("bitvector width mismatch: {left} vs {right}")]
    WidthMismatch {
        /// Width of the left operand
        left: u32,
        /// Width of the right operand
        right: u32,
    },

    /// Slice bounds outside the bitvector
    #[error("invalid slice [{lower}, {upper}] of a {width}-bit bitvector")]
    InvalidSlice {
        /// Lowest bit (inclusive)
        lower: u32,
        /// Highest bit (inclusive)
        upper: u32,
        /// Width of the sliced bitvector
        width: u32,
    },

    /// Reference to a bitvector id that was never created.
    #[error("unknown bitvector {0}")]
    UnknownBitvector(u32),

    /// Reference to a graph id that was never created.
    #[error("unknown graph {0}")]
    UnknownGraph(u32),

    /// Reference to a node that does not belong to the graph.
    #[error("unknown node {node} in graph {graph}")]
    UnknownNode {
        /// Graph id
        graph: u32,
        /// Node id
        node: u32,
    },

    /// Literal over a variable that was never allocated.
    #[error("literal over unallocated variable {0}")]
    UnknownVariable(u32),

    /// Literal that is not bound to any graph predicate or edge.
    #[error("literal over variable {0} is not a graph literal")]
    NotAGraphLiteral(u32),

    /// Operation that needs at least one operand.
    #[error("{0} needs at least one operand")]
    EmptyOperands(&'static str),

    /// Model query without a satisfying assignment from the last solve.
    #[error("no model available: the last solve did not return SAT")]
    NoModel,

    /// Search ended without an answer (a resource limit was hit).
    #[error("failed to solve: {0}")]
    SolveFailed(String),

    /// Malformed input file
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// I/O failure while reading input
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Create a parse error at the given line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// True if the error points at malformed input rather than API misuse.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Io(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
