//! Tseitin gate encoding with constant folding
//!
//! Every gate returns a literal equivalent to its output. Inputs that are the
//! constant true/false literal, or trivially related to each other, fold
//! without allocating variables.

use bvgraph_sat::{Lit, Solver as SatSolver};
use smallvec::SmallVec;

/// Gate builder over a SAT solver
#[derive(Debug)]
pub struct Circuit<'a> {
    sat: &'a mut SatSolver,
    true_lit: Lit,
}

impl<'a> Circuit<'a> {
    /// Create a builder; `true_lit` must be fixed true in `sat`
    pub fn new(sat: &'a mut SatSolver, true_lit: Lit) -> Self {
        Self { sat, true_lit }
    }

    /// The constant true literal
    #[must_use]
    pub fn true_lit(&self) -> Lit {
        self.true_lit
    }

    /// The constant false literal
    #[must_use]
    pub fn false_lit(&self) -> Lit {
        !self.true_lit
    }

    /// Constant literal for `value`
    #[must_use]
    pub fn constant(&self, value: bool) -> Lit {
        if value { self.true_lit } else { !self.true_lit }
    }

    /// `Some(b)` if `lit` is the constant `b`
    #[must_use]
    pub fn const_value(&self, lit: Lit) -> Option<bool> {
        if lit == self.true_lit {
            Some(true)
        } else if lit == !self.true_lit {
            Some(false)
        } else {
            None
        }
    }

    /// Fresh unconstrained literal
    pub fn fresh(&mut self) -> Lit {
        Lit::pos(self.sat.new_var())
    }

    /// Add a clause to the underlying solver
    pub fn add_clause(&mut self, lits: impl IntoIterator<Item = Lit>) -> bool {
        self.sat.add_clause(lits)
    }

    /// `a ∧ b`
    pub fn and2(&mut self, a: Lit, b: Lit) -> Lit {
        match (self.const_value(a), self.const_value(b)) {
            (Some(false), _) | (_, Some(false)) => return self.false_lit(),
            (Some(true), _) => return b,
            (_, Some(true)) => return a,
            _ => {}
        }
        if a == b {
            return a;
        }
        if a == !b {
            return self.false_lit();
        }
        let out = self.fresh();
        self.sat.add_clause([!out, a]);
        self.sat.add_clause([!out, b]);
        self.sat.add_clause([out, !a, !b]);
        out
    }

    /// `a ∨ b`
    pub fn or2(&mut self, a: Lit, b: Lit) -> Lit {
        !self.and2(!a, !b)
    }

    /// `a ⊕ b`
    pub fn xor2(&mut self, a: Lit, b: Lit) -> Lit {
        if let Some(v) = self.const_value(a) {
            return if v { !b } else { b };
        }
        if let Some(v) = self.const_value(b) {
            return if v { !a } else { a };
        }
        if a == b {
            return self.false_lit();
        }
        if a == !b {
            return self.true_lit;
        }
        let out = self.fresh();
        self.sat.add_clause([!out, !a, !b]);
        self.sat.add_clause([!out, a, b]);
        self.sat.add_clause([out, !a, b]);
        self.sat.add_clause([out, a, !b]);
        out
    }

    /// `a ⇔ b`
    pub fn xnor2(&mut self, a: Lit, b: Lit) -> Lit {
        !self.xor2(a, b)
    }

    /// `a ⇒ b`
    pub fn implies(&mut self, a: Lit, b: Lit) -> Lit {
        self.or2(!a, b)
    }

    /// `sel ? if_true : if_false`
    pub fn mux(&mut self, sel: Lit, if_true: Lit, if_false: Lit) -> Lit {
        if let Some(v) = self.const_value(sel) {
            return if v { if_true } else { if_false };
        }
        if if_true == if_false {
            return if_true;
        }
        if self.const_value(if_true).is_some() || self.const_value(if_false).is_some() {
            // One constant input reduces to a single gate
            let a = self.and2(sel, if_true);
            let b = self.and2(!sel, if_false);
            return self.or2(a, b);
        }
        let out = self.fresh();
        self.sat.add_clause([!sel, !if_true, out]);
        self.sat.add_clause([!sel, if_true, !out]);
        self.sat.add_clause([sel, !if_false, out]);
        self.sat.add_clause([sel, if_false, !out]);
        // Redundant but strengthens propagation
        self.sat.add_clause([!if_true, !if_false, out]);
        self.sat.add_clause([if_true, if_false, !out]);
        out
    }

    /// Conjunction of all `lits` (true when empty)
    pub fn and_all(&mut self, lits: &[Lit]) -> Lit {
        let mut inputs: SmallVec<[Lit; 16]> = SmallVec::new();
        for &lit in lits {
            match self.const_value(lit) {
                Some(true) => {}
                Some(false) => return self.false_lit(),
                None => {
                    if inputs.contains(&!lit) {
                        return self.false_lit();
                    }
                    if !inputs.contains(&lit) {
                        inputs.push(lit);
                    }
                }
            }
        }
        match inputs.len() {
            0 => self.true_lit,
            1 => inputs[0],
            2 => self.and2(inputs[0], inputs[1]),
            _ => {
                let out = self.fresh();
                let mut long: SmallVec<[Lit; 16]> = SmallVec::new();
                long.push(out);
                for &lit in &inputs {
                    self.sat.add_clause([!out, lit]);
                    long.push(!lit);
                }
                self.sat.add_clause(long);
                out
            }
        }
    }

    /// Disjunction of all `lits` (false when empty)
    pub fn or_all(&mut self, lits: &[Lit]) -> Lit {
        let negated: SmallVec<[Lit; 16]> = lits.iter().map(|&l| !l).collect();
        !self.and_all(&negated)
    }

    /// Full adder: returns `(sum, carry_out)` of `a + b + carry_in`
    pub fn full_adder(&mut self, a: Lit, b: Lit, carry_in: Lit) -> (Lit, Lit) {
        let xor_ab = self.xor2(a, b);
        let sum = self.xor2(xor_ab, carry_in);
        let and_ab = self.and2(a, b);
        let and_cin = self.and2(carry_in, xor_ab);
        let carry_out = self.or2(and_ab, and_cin);
        (sum, carry_out)
    }

    /// Ripple-carry adder over equal-width operands; returns `(sum, carry_out)`
    pub fn adder(&mut self, a: &[Lit], b: &[Lit]) -> (Vec<Lit>, Lit) {
        debug_assert_eq!(a.len(), b.len());
        let mut carry = self.false_lit();
        let mut sum = Vec::with_capacity(a.len());
        for (&x, &y) in a.iter().zip(b) {
            let (s, c) = self.full_adder(x, y, carry);
            sum.push(s);
            carry = c;
        }
        (sum, carry)
    }

    /// Unsigned `a < b` over equal-width operands, LSB first.
    ///
    /// Bits are compared from LSB to MSB; a differing higher bit overrides
    /// every lower one: `lt_i = (¬a_i ∧ b_i) ∨ ((a_i ⇔ b_i) ∧ lt_{i-1})`.
    pub fn less_than(&mut self, a: &[Lit], b: &[Lit]) -> Lit {
        debug_assert_eq!(a.len(), b.len());
        let mut lt = self.false_lit();
        for (&ai, &bi) in a.iter().zip(b) {
            let here = self.and2(!ai, bi);
            let same = self.xnor2(ai, bi);
            let carried = self.and2(same, lt);
            lt = self.or2(here, carried);
        }
        lt
    }

    /// Bitwise equality of equal-width operands
    pub fn equal(&mut self, a: &[Lit], b: &[Lit]) -> Lit {
        debug_assert_eq!(a.len(), b.len());
        let same: SmallVec<[Lit; 16]> = a
            .iter()
            .zip(b)
            .map(|(&x, &y)| self.xnor2(x, y))
            .collect();
        self.and_all(&same)
    }

    /// Constrain at most one of `lits` to be true.
    ///
    /// Pairwise for short lists, a sequential counter otherwise.
    pub fn at_most_one(&mut self, lits: &[Lit]) -> bool {
        if lits.len() <= 6 {
            for i in 0..lits.len() {
                for j in (i + 1)..lits.len() {
                    if !self.sat.add_clause([!lits[i], !lits[j]]) {
                        return false;
                    }
                }
            }
            return true;
        }

        let n = lits.len();
        let counters: Vec<Lit> = (0..n - 1).map(|_| self.fresh()).collect();
        let mut ok = self.sat.add_clause([!lits[0], counters[0]]);
        for i in 1..n - 1 {
            ok &= self.sat.add_clause([!lits[i], counters[i]]);
            ok &= self.sat.add_clause([!counters[i - 1], counters[i]]);
            ok &= self.sat.add_clause([!lits[i], !counters[i - 1]]);
        }
        ok &= self.sat.add_clause([!lits[n - 1], !counters[n - 2]]);
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bvgraph_sat::SolverResult;

    fn setup() -> (SatSolver, Lit) {
        let mut sat = SatSolver::new();
        let t = Lit::pos(sat.new_var());
        sat.add_clause([t]);
        (sat, t)
    }

    #[test]
    fn test_constant_folding_allocates_nothing() {
        let (mut sat, t) = setup();
        let x = Lit::pos(sat.new_var());
        let before = sat.num_vars();
        let mut c = Circuit::new(&mut sat, t);

        assert_eq!(c.and2(x, t), x);
        assert_eq!(c.and2(x, !t), !t);
        assert_eq!(c.or2(x, t), t);
        assert_eq!(c.xor2(x, t), !x);
        assert_eq!(c.xor2(x, x), !t);
        assert_eq!(c.mux(t, x, !x), x);
        assert_eq!(c.and_all(&[]), t);
        assert_eq!(c.or_all(&[]), !t);
        drop(c);
        assert_eq!(sat.num_vars(), before);
    }

    #[test]
    fn test_gates_by_enumeration() {
        for bits in 0..8u32 {
            let (mut sat, t) = setup();
            let ins: Vec<Lit> = (0..3).map(|_| Lit::pos(sat.new_var())).collect();
            let mut c = Circuit::new(&mut sat, t);
            let and = c.and2(ins[0], ins[1]);
            let xor = c.xor2(ins[0], ins[1]);
            let mux = c.mux(ins[2], ins[0], ins[1]);
            let all = c.and_all(&ins);
            for (i, &lit) in ins.iter().enumerate() {
                c.add_clause([if bits >> i & 1 == 1 { lit } else { !lit }]);
            }
            assert_eq!(sat.solve(), SolverResult::Sat);

            let v = |i: u32| bits >> i & 1 == 1;
            assert_eq!(sat.model_value(and).is_true(), v(0) && v(1));
            assert_eq!(sat.model_value(xor).is_true(), v(0) ^ v(1));
            assert_eq!(sat.model_value(mux).is_true(), if v(2) { v(0) } else { v(1) });
            assert_eq!(sat.model_value(all).is_true(), bits == 7);
        }
    }

    #[test]
    fn test_at_most_one_sequential_counter() {
        let (mut sat, t) = setup();
        let lits: Vec<Lit> = (0..9).map(|_| Lit::pos(sat.new_var())).collect();
        let mut c = Circuit::new(&mut sat, t);
        assert!(c.at_most_one(&lits));

        assert_eq!(sat.solve_with_assumptions(&[lits[2]]), SolverResult::Sat);
        let true_count = lits.iter().filter(|&&l| sat.model_value(l).is_true()).count();
        assert_eq!(true_count, 1);
        assert_eq!(
            sat.solve_with_assumptions(&[lits[0], lits[8]]),
            SolverResult::Unsat
        );
    }
}
