//! Comparison operators over unsigned bitvectors

use std::fmt;
use std::str::FromStr;

/// A comparison between two unsigned values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `<`
    Lt,
    /// `<=`
    Leq,
    /// `>`
    Gt,
    /// `>=`
    Geq,
    /// `==`
    Eq,
    /// `!=`
    Neq,
}

impl Comparison {
    /// All operators
    pub const ALL: [Comparison; 6] = [
        Comparison::Lt,
        Comparison::Leq,
        Comparison::Gt,
        Comparison::Geq,
        Comparison::Eq,
        Comparison::Neq,
    ];

    /// Evaluate on concrete values
    #[must_use]
    pub fn eval(self, lhs: u64, rhs: u64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Leq => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Geq => lhs >= rhs,
            Self::Eq => lhs == rhs,
            Self::Neq => lhs != rhs,
        }
    }

    /// The operator whose result is the negation of this one.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Lt => Self::Geq,
            Self::Leq => Self::Gt,
            Self::Gt => Self::Leq,
            Self::Geq => Self::Lt,
            Self::Eq => Self::Neq,
            Self::Neq => Self::Eq,
        }
    }

    /// The operator with swapped operands: `a op b ⇔ b op.swap() a`.
    #[must_use]
    pub fn swap(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Leq => Self::Geq,
            Self::Gt => Self::Lt,
            Self::Geq => Self::Leq,
            Self::Eq => Self::Eq,
            Self::Neq => Self::Neq,
        }
    }

    /// Operator symbol
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Leq => "<=",
            Self::Gt => ">",
            Self::Geq => ">=",
            Self::Eq => "==",
            Self::Neq => "!=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| format!("unknown comparison operator '{s}'"))
    }
}
