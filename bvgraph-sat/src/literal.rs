//! Variables, literals and three-valued Booleans

use std::fmt;
use std::ops::Not;

/// A Boolean variable (dense index starting at 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(u32);

impl Var {
    /// Create a variable from its index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Index of the variable, usable for indexing per-variable tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw id
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// A literal: a variable or its negation, encoded as `var << 1 | sign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(u32);

impl Lit {
    /// Positive literal of `var`
    #[must_use]
    pub const fn pos(var: Var) -> Self {
        Self(var.0 << 1)
    }

    /// Negative literal of `var`
    #[must_use]
    pub const fn neg(var: Var) -> Self {
        Self((var.0 << 1) | 1)
    }

    /// Literal of `var` with the given polarity.
    #[must_use]
    pub const fn new(var: Var, positive: bool) -> Self {
        if positive { Self::pos(var) } else { Self::neg(var) }
    }

    /// Variable of this literal
    #[must_use]
    pub const fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    /// True for negative literals
    #[must_use]
    pub const fn is_neg(self) -> bool {
        (self.0 & 1) == 1
    }

    /// True for positive literals
    #[must_use]
    pub const fn is_pos(self) -> bool {
        (self.0 & 1) == 0
    }

    /// Index usable for per-literal tables (watch lists).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Build from a per-literal table index.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// DIMACS integer: 1-based variable, negative for negated literals.
    #[must_use]
    pub fn to_dimacs(self) -> i32 {
        let v = self.var().0 as i32 + 1;
        if self.is_neg() { -v } else { v }
    }

    /// Literal from a non-zero DIMACS integer.
    #[must_use]
    pub fn from_dimacs(lit: i32) -> Self {
        debug_assert!(lit != 0);
        let var = Var(lit.unsigned_abs() - 1);
        Self::new(var, lit > 0)
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit(self.0 ^ 1)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// Three-valued Boolean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LBool {
    /// Assigned true
    True,
    /// Assigned false
    False,
    /// Not assigned
    #[default]
    Undef,
}

impl LBool {
    /// Convert from a Boolean
    #[must_use]
    pub const fn from_bool(b: bool) -> Self {
        if b { Self::True } else { Self::False }
    }

    /// True iff assigned true
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// True iff assigned false
    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::False)
    }

    /// True iff unassigned
    #[must_use]
    pub const fn is_undef(self) -> bool {
        matches!(self, Self::Undef)
    }

    /// `Some(bool)` if assigned
    #[must_use]
    pub const fn to_option(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Undef => None,
        }
    }

    /// Flip the value if `negate` is set; `Undef` stays `Undef`.
    #[must_use]
    pub const fn xor(self, negate: bool) -> Self {
        match (self, negate) {
            (Self::True, true) => Self::False,
            (Self::False, true) => Self::True,
            (v, _) => v,
        }
    }
}

impl Not for LBool {
    type Output = LBool;

    fn not(self) -> LBool {
        self.xor(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_encoding() {
        let v = Var::new(5);
        let p = Lit::pos(v);
        let n = Lit::neg(v);

        assert!(p.is_pos());
        assert!(n.is_neg());
        assert_eq!(p.var(), v);
        assert_eq!(n.var(), v);
        assert_eq!(!p, n);
        assert_eq!(!!p, p);
        assert_eq!(p.index() ^ 1, n.index());
    }

    #[test]
    fn test_dimacs_conversion() {
        assert_eq!(Lit::pos(Var::new(0)).to_dimacs(), 1);
        assert_eq!(Lit::neg(Var::new(2)).to_dimacs(), -3);
        assert_eq!(Lit::from_dimacs(-3), Lit::neg(Var::new(2)));
        assert_eq!(Lit::from_dimacs(4), Lit::pos(Var::new(3)));
    }

    #[test]
    fn test_lbool() {
        assert!(LBool::from_bool(true).is_true());
        assert_eq!(!LBool::True, LBool::False);
        assert_eq!(!LBool::Undef, LBool::Undef);
        assert_eq!(LBool::False.xor(false), LBool::False);
        assert_eq!(LBool::Undef.to_option(), None);
    }
}
