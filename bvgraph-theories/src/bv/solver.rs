//! Bitvector theory by eager bit-blasting
//!
//! Every bitvector is a vector of SAT literals, LSB first. Operations add
//! their defining circuit to the SAT solver as soon as they are created, so
//! the SAT model is always a bitvector model.

use crate::bv::Comparison;
use crate::circuit::Circuit;
use bvgraph_core::{Error, Result};
use bvgraph_sat::{LBool, Lit, Solver as SatSolver};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

/// Maximum bitvector width
pub const MAX_WIDTH: u32 = 64;

/// Handle of a bitvector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BvId(u32);

impl BvId {
    /// Create from a raw id
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw id
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Index for per-bitvector tables
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BvId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bv{}", self.0)
    }
}

/// A bit-blasted bitvector
#[derive(Debug, Clone)]
pub struct BvVar {
    /// Literal for each bit (LSB first)
    bits: SmallVec<[Lit; 16]>,
    /// Value when every bit is a constant literal
    constant: Option<u64>,
}

impl BvVar {
    /// Width in bits
    #[must_use]
    pub fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Bit literals, LSB first
    #[must_use]
    pub fn bits(&self) -> &[Lit] {
        &self.bits
    }
}

/// Right-hand side of a cached comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Operand {
    Bv(BvId),
    Const(u64),
}

/// Largest value representable in `width` bits
#[must_use]
pub fn max_value(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Value of `lit` under `model`
#[must_use]
pub fn model_value(model: &[LBool], lit: Lit) -> LBool {
    model
        .get(lit.var().index())
        .copied()
        .unwrap_or(LBool::Undef)
        .xor(lit.is_neg())
}

fn check_width(width: u32) -> Result<()> {
    if width == 0 || width > MAX_WIDTH {
        return Err(Error::InvalidWidth { width });
    }
    Ok(())
}

/// Bitvector theory
#[derive(Debug)]
pub struct BvTheory {
    true_lit: Lit,
    bvs: Vec<BvVar>,
    compare_cache: FxHashMap<(Comparison, BvId, Operand), Lit>,
}

impl BvTheory {
    /// Create the theory; `true_lit` must be fixed true in the SAT solver
    #[must_use]
    pub fn new(true_lit: Lit) -> Self {
        Self {
            true_lit,
            bvs: Vec::new(),
            compare_cache: FxHashMap::default(),
        }
    }

    /// The constant true literal
    #[must_use]
    pub fn true_lit(&self) -> Lit {
        self.true_lit
    }

    /// Number of bitvectors
    #[must_use]
    pub fn len(&self) -> usize {
        self.bvs.len()
    }

    /// True if no bitvector exists
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bvs.is_empty()
    }

    /// Look up a bitvector
    pub fn get(&self, id: BvId) -> Result<&BvVar> {
        self.bvs
            .get(id.index())
            .ok_or(Error::UnknownBitvector(id.id()))
    }

    /// Width of `id`
    pub fn width(&self, id: BvId) -> Result<u32> {
        Ok(self.get(id)?.width())
    }

    /// Bit literals of `id`, LSB first
    pub fn bits(&self, id: BvId) -> Result<&[Lit]> {
        Ok(self.get(id)?.bits())
    }

    /// Value of `id` if it is a constant
    pub fn constant_value(&self, id: BvId) -> Result<Option<u64>> {
        Ok(self.get(id)?.constant)
    }

    fn push(&mut self, bits: SmallVec<[Lit; 16]>) -> BvId {
        let id = BvId(self.bvs.len() as u32);
        let constant = self.fold_constant(&bits);
        self.bvs.push(BvVar { bits, constant });
        id
    }

    fn fold_constant(&self, bits: &[Lit]) -> Option<u64> {
        bits.iter().enumerate().try_fold(0u64, |acc, (i, &bit)| {
            if bit == self.true_lit {
                Some(acc | (1 << i))
            } else if bit == !self.true_lit {
                Some(acc)
            } else {
                None
            }
        })
    }

    fn same_width(&self, a: BvId, b: BvId) -> Result<u32> {
        let (wa, wb) = (self.width(a)?, self.width(b)?);
        if wa != wb {
            return Err(Error::WidthMismatch {
                left: wa,
                right: wb,
            });
        }
        Ok(wa)
    }

    /// Fresh unconstrained bitvector
    pub fn new_bv(&mut self, sat: &mut SatSolver, width: u32) -> Result<BvId> {
        check_width(width)?;
        let bits = (0..width).map(|_| Lit::pos(sat.new_var())).collect();
        Ok(self.push(bits))
    }

    /// Constant bitvector backed by the constant literals
    pub fn constant(&mut self, width: u32, value: u64) -> Result<BvId> {
        check_width(width)?;
        if value > max_value(width) {
            return Err(Error::ConstantOutOfRange { value, width });
        }
        let bits = (0..width)
            .map(|i| {
                if value >> i & 1 == 1 {
                    self.true_lit
                } else {
                    !self.true_lit
                }
            })
            .collect();
        Ok(self.push(bits))
    }

    /// Bitvector over existing literals, LSB first
    pub fn from_lits(&mut self, lits: &[Lit]) -> Result<BvId> {
        check_width(lits.len() as u32)?;
        Ok(self.push(lits.iter().copied().collect()))
    }

    /// `a + b`; an overflowing sum makes the constraint unsatisfiable
    pub fn add(&mut self, sat: &mut SatSolver, a: BvId, b: BvId) -> Result<BvId> {
        self.same_width(a, b)?;
        let (xa, xb) = (self.bits(a)?.to_vec(), self.bits(b)?.to_vec());
        let mut c = Circuit::new(sat, self.true_lit);
        let (sum, carry) = c.adder(&xa, &xb);
        c.add_clause([!carry]);
        trace!(%a, %b, "bit-blasted non-wrapping addition");
        Ok(self.push(sum.into_iter().collect()))
    }

    /// `a - b`; `b > a` makes the constraint unsatisfiable
    pub fn sub(&mut self, sat: &mut SatSolver, a: BvId, b: BvId) -> Result<BvId> {
        let width = self.same_width(a, b)?;
        let result = self.new_bv(sat, width)?;
        let (xa, xb, xr) = (
            self.bits(a)?.to_vec(),
            self.bits(b)?.to_vec(),
            self.bits(result)?.to_vec(),
        );
        // result + b == a without overflow
        let mut c = Circuit::new(sat, self.true_lit);
        let (sum, carry) = c.adder(&xr, &xb);
        c.add_clause([!carry]);
        for (s, x) in sum.into_iter().zip(xa) {
            let same = c.xnor2(s, x);
            c.add_clause([same]);
        }
        Ok(result)
    }

    fn bitwise(
        &mut self,
        sat: &mut SatSolver,
        a: BvId,
        b: BvId,
        gate: impl Fn(&mut Circuit<'_>, Lit, Lit) -> Lit,
    ) -> Result<BvId> {
        self.same_width(a, b)?;
        let (xa, xb) = (self.bits(a)?.to_vec(), self.bits(b)?.to_vec());
        let mut c = Circuit::new(sat, self.true_lit);
        let bits = xa.into_iter().zip(xb).map(|(x, y)| gate(&mut c, x, y)).collect();
        Ok(self.push(bits))
    }

    /// Bitwise complement; shares the negated bit literals
    pub fn not(&mut self, a: BvId) -> Result<BvId> {
        let bits = self.bits(a)?.iter().map(|&l| !l).collect();
        Ok(self.push(bits))
    }

    /// Bitwise `a & b`
    pub fn and(&mut self, sat: &mut SatSolver, a: BvId, b: BvId) -> Result<BvId> {
        self.bitwise(sat, a, b, |c, x, y| c.and2(x, y))
    }

    /// Bitwise `a | b`
    pub fn or(&mut self, sat: &mut SatSolver, a: BvId, b: BvId) -> Result<BvId> {
        self.bitwise(sat, a, b, |c, x, y| c.or2(x, y))
    }

    /// Bitwise `a ^ b`
    pub fn xor(&mut self, sat: &mut SatSolver, a: BvId, b: BvId) -> Result<BvId> {
        self.bitwise(sat, a, b, |c, x, y| c.xor2(x, y))
    }

    /// Bitwise `!(a & b)`
    pub fn nand(&mut self, sat: &mut SatSolver, a: BvId, b: BvId) -> Result<BvId> {
        self.bitwise(sat, a, b, |c, x, y| !c.and2(x, y))
    }

    /// Bitwise `!(a | b)`
    pub fn nor(&mut self, sat: &mut SatSolver, a: BvId, b: BvId) -> Result<BvId> {
        self.bitwise(sat, a, b, |c, x, y| !c.or2(x, y))
    }

    /// Bitwise `!(a ^ b)`
    pub fn xnor(&mut self, sat: &mut SatSolver, a: BvId, b: BvId) -> Result<BvId> {
        self.bitwise(sat, a, b, |c, x, y| c.xnor2(x, y))
    }

    /// `cond ? then : else`
    pub fn ite(
        &mut self,
        sat: &mut SatSolver,
        cond: Lit,
        then_bv: BvId,
        else_bv: BvId,
    ) -> Result<BvId> {
        self.same_width(then_bv, else_bv)?;
        let (xt, xe) = (self.bits(then_bv)?.to_vec(), self.bits(else_bv)?.to_vec());
        let mut c = Circuit::new(sat, self.true_lit);
        let bits = xt
            .into_iter()
            .zip(xe)
            .map(|(t, e)| c.mux(cond, t, e))
            .collect();
        Ok(self.push(bits))
    }

    /// Concatenation: `low` supplies the low bits, `high` the high bits
    pub fn concat(&mut self, low: BvId, high: BvId) -> Result<BvId> {
        let mut bits: SmallVec<[Lit; 16]> = self.bits(low)?.iter().copied().collect();
        bits.extend_from_slice(self.bits(high)?);
        check_width(bits.len() as u32)?;
        Ok(self.push(bits))
    }

    /// Bits `lower..=upper` of `a`
    pub fn slice(&mut self, a: BvId, lower: u32, upper: u32) -> Result<BvId> {
        let width = self.width(a)?;
        if lower > upper || upper >= width {
            return Err(Error::InvalidSlice {
                lower,
                upper,
                width,
            });
        }
        let bits = self.bits(a)?[lower as usize..=upper as usize]
            .iter()
            .copied()
            .collect();
        Ok(self.push(bits))
    }

    fn extremum(&mut self, sat: &mut SatSolver, args: &[BvId], take_min: bool) -> Result<BvId> {
        let (&first, rest) = args
            .split_first()
            .ok_or(Error::EmptyOperands(if take_min { "min" } else { "max" }))?;
        let mut best = first;
        self.get(first)?;
        for &next in rest {
            let lt = self.compare(sat, Comparison::Lt, next, best)?;
            best = if take_min {
                self.ite(sat, lt, next, best)?
            } else {
                self.ite(sat, lt, best, next)?
            };
        }
        Ok(best)
    }

    /// Minimum of one or more equal-width bitvectors
    pub fn min(&mut self, sat: &mut SatSolver, args: &[BvId]) -> Result<BvId> {
        self.extremum(sat, args, true)
    }

    /// Maximum of one or more equal-width bitvectors
    pub fn max(&mut self, sat: &mut SatSolver, args: &[BvId]) -> Result<BvId> {
        self.extremum(sat, args, false)
    }

    /// Number of true literals among `lits`, wide enough to never overflow
    pub fn popcount(&mut self, sat: &mut SatSolver, lits: &[Lit]) -> Result<BvId> {
        let width = (u64::BITS - (lits.len() as u64).leading_zeros()).max(1);
        check_width(width)?;
        let mut c = Circuit::new(sat, self.true_lit);
        let mut sum: Vec<Lit> = vec![c.false_lit(); width as usize];
        for &lit in lits {
            // Increment by `lit`
            let mut carry = lit;
            for bit in &mut sum {
                let next = c.and2(*bit, carry);
                *bit = c.xor2(*bit, carry);
                carry = next;
            }
        }
        Ok(self.push(sum.into_iter().collect()))
    }

    /// Literal equivalent to `a op b`
    pub fn compare(&mut self, sat: &mut SatSolver, op: Comparison, a: BvId, b: BvId) -> Result<Lit> {
        self.same_width(a, b)?;
        let key = (op, a, Operand::Bv(b));
        if let Some(&lit) = self.compare_cache.get(&key) {
            return Ok(lit);
        }
        let (xa, xb) = (self.bits(a)?.to_vec(), self.bits(b)?.to_vec());
        let lit = self.encode_compare(sat, op, &xa, &xb);
        self.compare_cache.insert(key, lit);
        Ok(lit)
    }

    /// Literal equivalent to `a op value`.
    ///
    /// Comparisons decided by the range of `a` alone fold to a constant.
    pub fn compare_const(
        &mut self,
        sat: &mut SatSolver,
        op: Comparison,
        a: BvId,
        value: u64,
    ) -> Result<Lit> {
        let width = self.width(a)?;
        let max = max_value(width);
        let t = self.true_lit;
        let folded = match op {
            Comparison::Lt if value == 0 => Some(false),
            Comparison::Lt if value > max => Some(true),
            Comparison::Leq if value >= max => Some(true),
            Comparison::Gt if value >= max => Some(false),
            Comparison::Geq if value == 0 => Some(true),
            Comparison::Geq if value > max => Some(false),
            Comparison::Eq if value > max => Some(false),
            Comparison::Neq if value > max => Some(true),
            _ => None,
        };
        if let Some(result) = folded {
            return Ok(if result { t } else { !t });
        }

        let key = (op, a, Operand::Const(value));
        if let Some(&lit) = self.compare_cache.get(&key) {
            return Ok(lit);
        }
        let xa = self.bits(a)?.to_vec();
        let xc: Vec<Lit> = (0..width)
            .map(|i| if value >> i & 1 == 1 { t } else { !t })
            .collect();
        let lit = self.encode_compare(sat, op, &xa, &xc);
        trace!(bv = %a, %op, value, ?lit, "comparison atom");
        self.compare_cache.insert(key, lit);
        Ok(lit)
    }

    fn encode_compare(&self, sat: &mut SatSolver, op: Comparison, a: &[Lit], b: &[Lit]) -> Lit {
        let mut c = Circuit::new(sat, self.true_lit);
        match op {
            Comparison::Lt => c.less_than(a, b),
            Comparison::Geq => !c.less_than(a, b),
            Comparison::Gt => c.less_than(b, a),
            Comparison::Leq => !c.less_than(b, a),
            Comparison::Eq => c.equal(a, b),
            Comparison::Neq => !c.equal(a, b),
        }
    }

    /// Value of `id` under `model`; unassigned bits read as 0
    pub fn value(&self, model: &[LBool], id: BvId) -> Result<u64> {
        self.read(model, id, false)
    }

    /// Largest value of `id` consistent with `model`: unassigned bits read as 1.
    ///
    /// Bits are unassigned only when their variables were excluded from
    /// decisions, so for most models this equals [`Self::value`].
    pub fn upper_value(&self, model: &[LBool], id: BvId) -> Result<u64> {
        self.read(model, id, true)
    }

    fn read(&self, model: &[LBool], id: BvId, undef_high: bool) -> Result<u64> {
        let bv = self.get(id)?;
        if let Some(value) = bv.constant {
            return Ok(value);
        }
        Ok(bv
            .bits
            .iter()
            .enumerate()
            .filter(|&(_, &bit)| match model_value(model, bit) {
                LBool::True => true,
                LBool::False => false,
                LBool::Undef => undef_high,
            })
            .fold(0u64, |acc, (i, _)| acc | (1 << i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bvgraph_sat::SolverResult;

    fn setup() -> (SatSolver, BvTheory) {
        let mut sat = SatSolver::new();
        let t = Lit::pos(sat.new_var());
        sat.add_clause([t]);
        (sat, BvTheory::new(t))
    }

    #[test]
    fn test_width_checks() {
        let (mut sat, mut bv) = setup();
        assert_eq!(
            bv.new_bv(&mut sat, 0),
            Err(Error::InvalidWidth { width: 0 })
        );
        assert_eq!(
            bv.new_bv(&mut sat, 65),
            Err(Error::InvalidWidth { width: 65 })
        );
        assert_eq!(
            bv.constant(4, 16),
            Err(Error::ConstantOutOfRange {
                value: 16,
                width: 4
            })
        );

        let a = bv.new_bv(&mut sat, 4).unwrap();
        let b = bv.new_bv(&mut sat, 5).unwrap();
        assert_eq!(
            bv.add(&mut sat, a, b),
            Err(Error::WidthMismatch { left: 4, right: 5 })
        );
        assert_eq!(
            bv.slice(a, 2, 4),
            Err(Error::InvalidSlice {
                lower: 2,
                upper: 4,
                width: 4
            })
        );
        assert_eq!(bv.width(BvId::new(9)), Err(Error::UnknownBitvector(9)));
    }

    #[test]
    fn test_constants_fold() {
        let (mut sat, mut bv) = setup();
        let a = bv.constant(4, 9).unwrap();
        let b = bv.constant(4, 3).unwrap();
        let vars_before = sat.num_vars();

        let sum = bv.add(&mut sat, a, b).unwrap();
        assert_eq!(bv.constant_value(sum).unwrap(), Some(12));
        let lt = bv.compare(&mut sat, Comparison::Lt, b, a).unwrap();
        assert_eq!(lt, bv.true_lit());
        assert_eq!(sat.num_vars(), vars_before);
    }

    #[test]
    fn test_range_folding() {
        let (mut sat, mut bv) = setup();
        let x = bv.new_bv(&mut sat, 4).unwrap();
        let t = bv.true_lit();

        assert_eq!(bv.compare_const(&mut sat, Comparison::Lt, x, 0).unwrap(), !t);
        assert_eq!(bv.compare_const(&mut sat, Comparison::Geq, x, 0).unwrap(), t);
        assert_eq!(bv.compare_const(&mut sat, Comparison::Leq, x, 15).unwrap(), t);
        assert_eq!(bv.compare_const(&mut sat, Comparison::Gt, x, 15).unwrap(), !t);
        assert_eq!(bv.compare_const(&mut sat, Comparison::Eq, x, 99).unwrap(), !t);
    }

    #[test]
    fn test_comparisons_are_cached() {
        let (mut sat, mut bv) = setup();
        let x = bv.new_bv(&mut sat, 4).unwrap();
        let y = bv.new_bv(&mut sat, 4).unwrap();
        let first = bv.compare(&mut sat, Comparison::Leq, x, y).unwrap();
        let vars = sat.num_vars();
        assert_eq!(bv.compare(&mut sat, Comparison::Leq, x, y).unwrap(), first);
        assert_eq!(sat.num_vars(), vars);
    }

    #[test]
    fn test_overflow_is_unsat() {
        let (mut sat, mut bv) = setup();
        let x = bv.new_bv(&mut sat, 4).unwrap();
        let y = bv.new_bv(&mut sat, 4).unwrap();
        let sum = bv.add(&mut sat, x, y).unwrap();
        let x_big = bv.compare_const(&mut sat, Comparison::Geq, x, 9).unwrap();
        let y_big = bv.compare_const(&mut sat, Comparison::Geq, y, 8).unwrap();

        assert_eq!(sat.solve_with_assumptions(&[x_big, y_big]), SolverResult::Unsat);
        assert_eq!(sat.solve_with_assumptions(&[x_big]), SolverResult::Sat);
        let model = sat.model().to_vec();
        let (vx, vy, vs) = (
            bv.value(&model, x).unwrap(),
            bv.value(&model, y).unwrap(),
            bv.value(&model, sum).unwrap(),
        );
        assert_eq!(vx + vy, vs);
        assert!(vs <= 15);
    }

    #[test]
    fn test_slice_and_concat_share_bits() {
        let (mut sat, mut bv) = setup();
        let x = bv.new_bv(&mut sat, 8).unwrap();
        let low = bv.slice(x, 0, 3).unwrap();
        let high = bv.slice(x, 4, 7).unwrap();
        let whole = bv.concat(low, high).unwrap();
        assert_eq!(bv.bits(whole).unwrap(), bv.bits(x).unwrap());
        assert_eq!(bv.width(high).unwrap(), 4);
    }

    #[test]
    fn test_upper_value_reads_unassigned_bits_high() {
        let (mut sat, mut bv) = setup();
        let x = bv.new_bv(&mut sat, 4).unwrap();
        let bits = bv.bits(x).unwrap().to_vec();
        sat.add_clause([bits[0]]);
        sat.add_clause([!bits[1]]);
        for bit in &bits[2..] {
            sat.set_decision_var(bit.var(), false);
        }
        assert_eq!(sat.solve(), SolverResult::Sat);
        let model = sat.model().to_vec();
        assert_eq!(bv.value(&model, x).unwrap(), 0b0001);
        assert_eq!(bv.upper_value(&model, x).unwrap(), 0b1101);

        let c = bv.constant(4, 6).unwrap();
        assert_eq!(bv.upper_value(&model, c).unwrap(), 6);
    }

    #[test]
    fn test_popcount_width() {
        let (mut sat, mut bv) = setup();
        let lits: Vec<Lit> = (0..5).map(|_| Lit::pos(sat.new_var())).collect();
        let count = bv.popcount(&mut sat, &lits).unwrap();
        assert_eq!(bv.width(count).unwrap(), 3);

        let empty = bv.popcount(&mut sat, &[]).unwrap();
        assert_eq!(bv.constant_value(empty).unwrap(), Some(0));
        assert_eq!(
            bv.min(&mut sat, &[]),
            Err(Error::EmptyOperands("min"))
        );
    }
}
