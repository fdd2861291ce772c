//! Solver context: one SAT solver, the bitvector theory and any number of
//! graphs behind a single handle-based API

use std::time::{Duration, Instant};

use bvgraph_core::{Config, Error, ResourceLimits, Result, SatParams};
use bvgraph_sat::{LBool, Lit, Solver as SatSolver, SolverConfig, SolverResult, Var};
use bvgraph_theories::bv::model_value;
use bvgraph_theories::{
    Bound, BvId, BvTheory, Circuit, Comparison, GraphId, GraphTheory, Lemma, Metric, NodeId,
    Predicate, Theory, TheoryEnv, TheoryResult, Weight,
};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of a limited solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveResult {
    /// Satisfiable; a model is available
    Sat,
    /// Unsatisfiable (possibly only under the assumptions).
    Unsat,
    /// A resource limit was reached first.
    Unknown,
}

impl SolveResult {
    /// True for [`SolveResult::Sat`]
    #[must_use]
    pub fn is_sat(self) -> bool {
        self == Self::Sat
    }
}

impl std::fmt::Display for SolveResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Sat => "SATISFIABLE",
            Self::Unsat => "UNSATISFIABLE",
            Self::Unknown => "UNKNOWN",
        })
    }
}

/// Solver statistics, cumulative over the lifetime of a context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Solve calls (each minimisation step counts).
    pub solves: u64,
    /// Theory refinement rounds that produced lemmas.
    pub theory_rounds: u64,
    /// Theory lemmas added
    pub theory_lemmas: u64,
    /// SAT decisions
    pub decisions: u64,
    /// SAT propagations
    pub propagations: u64,
    /// SAT conflicts
    pub conflicts: u64,
    /// SAT restarts
    pub restarts: u64,
    /// Learnt clauses
    pub learnt_clauses: u64,
}

/// SAT parameters for a configuration
#[must_use]
pub fn sat_config(params: &SatParams) -> SolverConfig {
    SolverConfig {
        var_decay: params.var_decay,
        clause_decay: params.clause_decay,
        random_var_freq: params.random_var_freq,
        random_seed: params.random_seed,
        random_initial_phase: params.random_initial_phase,
        restart_first: params.restart_first,
        luby_restart: params.luby_restart,
        restart_inc: params.restart_inc,
        learntsize_factor: params.learntsize_factor,
        learntsize_inc: params.learntsize_inc,
        phase_saving: params.phase_saving,
    }
}

/// Absolute resource targets of one solve, in SAT counter units.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Budget {
    conflicts: Option<u64>,
    propagations: Option<u64>,
    deadline: Option<Instant>,
}

impl Budget {
    pub(crate) fn unlimited() -> Self {
        Self::default()
    }

    fn from_limits(limits: &ResourceLimits, sat: &SatSolver) -> Self {
        let stats = sat.stats();
        Self {
            conflicts: (limits.conflicts > 0).then(|| stats.conflicts + limits.conflicts),
            propagations: (limits.propagations > 0)
                .then(|| stats.propagations + limits.propagations),
            deadline: (limits.time_secs > 0)
                .then(|| Instant::now() + Duration::from_secs(limits.time_secs)),
        }
    }

    /// Install the remaining budget in `sat`; false if it is already spent.
    fn arm(&self, sat: &mut SatSolver) -> bool {
        let stats = sat.stats();
        let conflicts = self.conflicts.map(|c| c.saturating_sub(stats.conflicts));
        let propagations = self.propagations.map(|p| p.saturating_sub(stats.propagations));
        if conflicts == Some(0)
            || propagations == Some(0)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
        {
            return false;
        }
        sat.set_conflict_budget(conflicts);
        sat.set_propagation_budget(propagations);
        sat.set_deadline(self.deadline);
        true
    }
}

/// A SAT modulo graphs and bitvectors problem and its solver.
///
/// All entities (variables, bitvectors, graphs, nodes, edges, predicates)
/// are created through the context and referred to by copyable handles.
/// Creating a theory atom returns a literal that can be asserted, negated or
/// used in clauses like any other.
///
/// # Examples
///
/// ```
/// use bvgraph_solver::{Comparison, Context};
///
/// let mut ctx = Context::new();
/// let g = ctx.new_graph();
/// let a = ctx.add_node(g).unwrap();
/// let b = ctx.add_node(g).unwrap();
/// let w = ctx.new_bv(4).unwrap();
/// ctx.add_edge_bv(g, a, b, w).unwrap();
/// let near = ctx.distance_leq(g, a, b, 3).unwrap();
/// ctx.assert_lit(near).unwrap();
/// let heavy = ctx.bv_compare_const(Comparison::Geq, w, 3).unwrap();
/// ctx.assert_lit(heavy).unwrap();
///
/// assert!(ctx.solve().unwrap());
/// assert_eq!(ctx.bv_value(w).unwrap(), 3);
/// ```
#[derive(Debug)]
pub struct Context {
    config: Config,
    sat: SatSolver,
    bv: BvTheory,
    graphs: Vec<GraphTheory>,
    /// Graph owning each edge and predicate variable.
    graph_lits: FxHashMap<Var, GraphId>,
    true_lit: Lit,
    model: Option<Vec<LBool>>,
    conflict: Vec<Lit>,
    optimal: bool,
    stats: Statistics,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a context with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a context with a custom configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let mut sat = SatSolver::with_config(sat_config(&config.sat));
        let true_lit = Lit::pos(sat.new_var());
        sat.add_clause([true_lit]);
        Self {
            config,
            sat,
            bv: BvTheory::new(true_lit),
            graphs: Vec::new(),
            graph_lits: FxHashMap::default(),
            true_lit,
            model: None,
            conflict: Vec::new(),
            optimal: true,
            stats: Statistics::default(),
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Random seed of the SAT search.
    #[must_use]
    pub fn random_seed(&self) -> u64 {
        self.config.sat.random_seed
    }

    fn check_lit(&self, lit: Lit) -> Result<()> {
        if lit.var().index() >= self.sat.num_vars() {
            return Err(Error::UnknownVariable(lit.var().id()));
        }
        Ok(())
    }

    fn check_lits(&self, lits: &[Lit]) -> Result<()> {
        lits.iter().try_for_each(|&lit| self.check_lit(lit))
    }

    fn circuit(&mut self) -> Circuit<'_> {
        Circuit::new(&mut self.sat, self.true_lit)
    }

    // ===== Boolean layer =====

    /// Allocate a fresh variable
    pub fn new_var(&mut self) -> Var {
        self.sat.new_var()
    }

    /// Allocate a fresh variable and return its positive literal.
    pub fn new_lit(&mut self) -> Lit {
        Lit::pos(self.sat.new_var())
    }

    /// The literal fixed to true
    #[must_use]
    pub fn true_lit(&self) -> Lit {
        self.true_lit
    }

    /// The literal fixed to false
    #[must_use]
    pub fn false_lit(&self) -> Lit {
        !self.true_lit
    }

    /// Add a clause.
    ///
    /// A clause that makes the problem trivially unsatisfiable is accepted;
    /// the next solve reports it.
    pub fn add_clause(&mut self, lits: &[Lit]) -> Result<()> {
        self.check_lits(lits)?;
        self.sat.add_clause(lits.iter().copied());
        Ok(())
    }

    /// Assert `lit` as a unit clause.
    pub fn assert_lit(&mut self, lit: Lit) -> Result<()> {
        self.add_clause(&[lit])
    }

    /// Literal equivalent to `a ∧ b`.
    pub fn and(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.check_lits(&[a, b])?;
        Ok(self.circuit().and2(a, b))
    }

    /// Literal equivalent to `a ∨ b`.
    pub fn or(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.check_lits(&[a, b])?;
        Ok(self.circuit().or2(a, b))
    }

    /// Literal equivalent to `a ⊕ b`.
    pub fn xor(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.check_lits(&[a, b])?;
        Ok(self.circuit().xor2(a, b))
    }

    /// Literal equivalent to `a → b`.
    pub fn implies(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.check_lits(&[a, b])?;
        Ok(self.circuit().implies(a, b))
    }

    /// Literal equivalent to `a ↔ b`.
    pub fn equiv(&mut self, a: Lit, b: Lit) -> Result<Lit> {
        self.check_lits(&[a, b])?;
        Ok(self.circuit().xnor2(a, b))
    }

    /// Literal equivalent to the conjunction of `lits` (true if empty).
    pub fn and_all(&mut self, lits: &[Lit]) -> Result<Lit> {
        self.check_lits(lits)?;
        Ok(self.circuit().and_all(lits))
    }

    /// Literal equivalent to the disjunction of `lits` (false if empty).
    pub fn or_all(&mut self, lits: &[Lit]) -> Result<Lit> {
        self.check_lits(lits)?;
        Ok(self.circuit().or_all(lits))
    }

    /// Constrain at most one of `lits` to be true.
    pub fn at_most_one(&mut self, lits: &[Lit]) -> Result<()> {
        self.check_lits(lits)?;
        self.circuit().at_most_one(lits);
        Ok(())
    }

    /// Preferred polarity when `var` is picked as a decision.
    pub fn set_decision_polarity(&mut self, var: Var, positive: bool) -> Result<()> {
        self.check_lit(Lit::pos(var))?;
        self.sat.set_polarity(var, positive);
        Ok(())
    }

    /// Allow or forbid decisions on `var`.
    pub fn set_decision_var(&mut self, var: Var, decision: bool) -> Result<()> {
        self.check_lit(Lit::pos(var))?;
        self.sat.set_decision_var(var, decision);
        Ok(())
    }

    /// Branch on `var` before every variable of a lower priority (default 0).
    pub fn set_decision_priority(&mut self, var: Var, priority: i32) -> Result<()> {
        self.check_lit(Lit::pos(var))?;
        self.sat.set_decision_priority(var, priority);
        Ok(())
    }

    /// Decision priority of `var`
    pub fn decision_priority(&self, var: Var) -> Result<i32> {
        self.check_lit(Lit::pos(var))?;
        Ok(self.sat.decision_priority(var))
    }

    // ===== Bitvectors =====

    /// Fresh unconstrained bitvector
    pub fn new_bv(&mut self, width: u32) -> Result<BvId> {
        self.bv.new_bv(&mut self.sat, width)
    }

    /// Constant bitvector
    pub fn bv_const(&mut self, width: u32, value: u64) -> Result<BvId> {
        self.bv.constant(width, value)
    }

    /// Bitvector over existing literals, LSB first.
    pub fn bv_from_lits(&mut self, lits: &[Lit]) -> Result<BvId> {
        self.check_lits(lits)?;
        self.bv.from_lits(lits)
    }

    /// Width of `id`
    pub fn bv_width(&self, id: BvId) -> Result<u32> {
        self.bv.width(id)
    }

    /// Bit literals of `id`, LSB first.
    pub fn bv_bits(&self, id: BvId) -> Result<&[Lit]> {
        self.bv.bits(id)
    }

    /// Number of bitvectors
    #[must_use]
    pub fn num_bitvectors(&self) -> usize {
        self.bv.len()
    }

    /// `a + b`; models where the sum overflows are excluded.
    pub fn bv_add(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv.add(&mut self.sat, a, b)
    }

    /// `a - b`; models where `b > a` are excluded.
    pub fn bv_sub(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv.sub(&mut self.sat, a, b)
    }

    /// `a + value`, with the constant at the width of `a`.
    ///
    /// Fails with [`Error::ConstantOutOfRange`] if `value` does not fit.
    pub fn bv_add_const(&mut self, a: BvId, value: u64) -> Result<BvId> {
        let c = self.bv_const(self.bv_width(a)?, value)?;
        self.bv_add(a, c)
    }

    /// `a - value`, with the constant at the width of `a`.
    pub fn bv_sub_const(&mut self, a: BvId, value: u64) -> Result<BvId> {
        let c = self.bv_const(self.bv_width(a)?, value)?;
        self.bv_sub(a, c)
    }

    /// Bitwise `!a`
    pub fn bv_not(&mut self, a: BvId) -> Result<BvId> {
        self.bv.not(a)
    }

    /// Bitwise `a & b`
    pub fn bv_and(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv.and(&mut self.sat, a, b)
    }

    /// Bitwise `a | b`
    pub fn bv_or(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv.or(&mut self.sat, a, b)
    }

    /// Bitwise `a ^ b`
    pub fn bv_xor(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv.xor(&mut self.sat, a, b)
    }

    /// Bitwise `!(a & b)`
    pub fn bv_nand(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv.nand(&mut self.sat, a, b)
    }

    /// Bitwise `!(a | b)`
    pub fn bv_nor(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv.nor(&mut self.sat, a, b)
    }

    /// Bitwise `!(a ^ b)`
    pub fn bv_xnor(&mut self, a: BvId, b: BvId) -> Result<BvId> {
        self.bv.xnor(&mut self.sat, a, b)
    }

    /// `cond ? then_bv : else_bv`
    pub fn bv_ite(&mut self, cond: Lit, then_bv: BvId, else_bv: BvId) -> Result<BvId> {
        self.check_lit(cond)?;
        self.bv.ite(&mut self.sat, cond, then_bv, else_bv)
    }

    /// `low` in the low bits, `high` above it.
    pub fn bv_concat(&mut self, low: BvId, high: BvId) -> Result<BvId> {
        self.bv.concat(low, high)
    }

    /// Bits `lower..=upper` of `a`
    pub fn bv_slice(&mut self, a: BvId, lower: u32, upper: u32) -> Result<BvId> {
        self.bv.slice(a, lower, upper)
    }

    /// Minimum of equal-width bitvectors
    pub fn bv_min(&mut self, args: &[BvId]) -> Result<BvId> {
        self.bv.min(&mut self.sat, args)
    }

    /// Maximum of equal-width bitvectors
    pub fn bv_max(&mut self, args: &[BvId]) -> Result<BvId> {
        self.bv.max(&mut self.sat, args)
    }

    /// Number of true literals among `lits`.
    pub fn bv_popcount(&mut self, lits: &[Lit]) -> Result<BvId> {
        self.check_lits(lits)?;
        self.bv.popcount(&mut self.sat, lits)
    }

    /// Literal equivalent to `a op b`.
    pub fn bv_compare(&mut self, op: Comparison, a: BvId, b: BvId) -> Result<Lit> {
        self.bv.compare(&mut self.sat, op, a, b)
    }

    /// Literal equivalent to `a op value`.
    pub fn bv_compare_const(&mut self, op: Comparison, a: BvId, value: u64) -> Result<Lit> {
        self.bv.compare_const(&mut self.sat, op, a, value)
    }

    // ===== Graphs =====

    /// Create an empty graph
    pub fn new_graph(&mut self) -> GraphId {
        let id = GraphId::new(self.graphs.len() as u32);
        self.graphs.push(GraphTheory::new(id));
        id
    }

    /// Number of graphs
    #[must_use]
    pub fn num_graphs(&self) -> usize {
        self.graphs.len()
    }

    fn graph(&self, g: GraphId) -> Result<&GraphTheory> {
        self.graphs.get(g.index()).ok_or(Error::UnknownGraph(g.id()))
    }

    /// Add a node to `g`
    pub fn add_node(&mut self, g: GraphId) -> Result<NodeId> {
        let graph = self
            .graphs
            .get_mut(g.index())
            .ok_or(Error::UnknownGraph(g.id()))?;
        Ok(graph.add_node())
    }

    /// Number of nodes of `g`
    pub fn num_nodes(&self, g: GraphId) -> Result<usize> {
        Ok(self.graph(g)?.num_nodes())
    }

    fn add_graph_edge(
        &mut self,
        g: GraphId,
        from: NodeId,
        to: NodeId,
        weight: Weight,
    ) -> Result<Lit> {
        let graph = self
            .graphs
            .get_mut(g.index())
            .ok_or(Error::UnknownGraph(g.id()))?;
        let lit = graph.add_edge(&mut self.sat, from, to, weight)?;
        self.graph_lits.insert(lit.var(), g);
        Ok(lit)
    }

    /// Add an edge of constant weight; returns its enable literal.
    pub fn add_edge(&mut self, g: GraphId, from: NodeId, to: NodeId, weight: u64) -> Result<Lit> {
        self.add_graph_edge(g, from, to, Weight::Const(weight))
    }

    /// Add an edge weighted by a bitvector; returns its enable literal.
    pub fn add_edge_bv(&mut self, g: GraphId, from: NodeId, to: NodeId, weight: BvId) -> Result<Lit> {
        self.bv.get(weight)?;
        self.add_graph_edge(g, from, to, Weight::Bv(weight))
    }

    fn add_predicate(&mut self, g: GraphId, predicate: Predicate) -> Result<Lit> {
        if let Predicate::Distance {
            bound: Bound::Bv(id),
            ..
        }
        | Predicate::MaxFlow {
            bound: Bound::Bv(id),
            ..
        }
        | Predicate::SpanningTree {
            bound: Bound::Bv(id),
            ..
        } = predicate
        {
            self.bv.get(id)?;
        }
        let graph = self
            .graphs
            .get_mut(g.index())
            .ok_or(Error::UnknownGraph(g.id()))?;
        let lit = graph.add_predicate(&mut self.sat, predicate)?;
        self.graph_lits.insert(lit.var(), g);
        Ok(lit)
    }

    fn distance(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        metric: Metric,
        bound: Bound,
        strict: bool,
    ) -> Result<Lit> {
        self.add_predicate(
            g,
            Predicate::Distance {
                source,
                target,
                metric,
                bound,
                strict,
            },
        )
    }

    /// Literal true iff `target` is reachable from `source`.
    pub fn reaches(&mut self, g: GraphId, source: NodeId, target: NodeId) -> Result<Lit> {
        self.add_predicate(g, Predicate::reach(source, target))
    }

    /// Literal true iff some path from `source` to `target` has at most `hops` edges.
    pub fn shortest_path_unweighted_leq(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        hops: u64,
    ) -> Result<Lit> {
        self.distance(g, source, target, Metric::Hops, Bound::Const(hops), false)
    }

    /// Literal true iff some path from `source` to `target` has fewer than `hops` edges.
    pub fn shortest_path_unweighted_lt(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        hops: u64,
    ) -> Result<Lit> {
        self.distance(g, source, target, Metric::Hops, Bound::Const(hops), true)
    }

    /// Literal true iff the weighted distance is at most `bound`.
    pub fn distance_leq(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        bound: u64,
    ) -> Result<Lit> {
        self.distance(g, source, target, Metric::Weighted, Bound::Const(bound), false)
    }

    /// Literal true iff the weighted distance is less than `bound`.
    pub fn distance_lt(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        bound: u64,
    ) -> Result<Lit> {
        self.distance(g, source, target, Metric::Weighted, Bound::Const(bound), true)
    }

    /// Literal true iff the weighted distance is at most the value of `bound`.
    pub fn distance_leq_bv(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        bound: BvId,
    ) -> Result<Lit> {
        self.distance(g, source, target, Metric::Weighted, Bound::Bv(bound), false)
    }

    /// Literal true iff the weighted distance is less than the value of `bound`.
    pub fn distance_lt_bv(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        bound: BvId,
    ) -> Result<Lit> {
        self.distance(g, source, target, Metric::Weighted, Bound::Bv(bound), true)
    }

    fn max_flow(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        bound: Bound,
        strict: bool,
    ) -> Result<Lit> {
        self.add_predicate(
            g,
            Predicate::MaxFlow {
                source,
                target,
                bound,
                strict,
            },
        )
    }

    /// Literal true iff the maximum flow is at least `bound`.
    pub fn maximum_flow_geq(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        bound: u64,
    ) -> Result<Lit> {
        self.max_flow(g, source, target, Bound::Const(bound), false)
    }

    /// Literal true iff the maximum flow is greater than `bound`.
    pub fn maximum_flow_gt(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        bound: u64,
    ) -> Result<Lit> {
        self.max_flow(g, source, target, Bound::Const(bound), true)
    }

    /// Literal true iff the maximum flow is at least the value of `bound`.
    pub fn maximum_flow_geq_bv(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        bound: BvId,
    ) -> Result<Lit> {
        self.max_flow(g, source, target, Bound::Bv(bound), false)
    }

    /// Literal true iff the maximum flow is greater than the value of `bound`.
    pub fn maximum_flow_gt_bv(
        &mut self,
        g: GraphId,
        source: NodeId,
        target: NodeId,
        bound: BvId,
    ) -> Result<Lit> {
        self.max_flow(g, source, target, Bound::Bv(bound), true)
    }

    /// Literal true iff the enabled edges of `g` form no (directed) cycle.
    pub fn acyclic(&mut self, g: GraphId, directed: bool) -> Result<Lit> {
        self.add_predicate(g, Predicate::Acyclic { directed })
    }

    /// Literal true iff the enabled edges of `g`, read as undirected, have a
    /// spanning tree of weight at most `bound`.
    ///
    /// A graph whose enabled edges leave some node unconnected has no
    /// spanning tree, so the literal is false there.
    pub fn minimum_spanning_tree_leq(&mut self, g: GraphId, bound: u64) -> Result<Lit> {
        self.spanning_tree(g, bound, false)
    }

    /// Literal true iff the minimum spanning tree of `g` weighs less than `bound`.
    pub fn minimum_spanning_tree_lt(&mut self, g: GraphId, bound: u64) -> Result<Lit> {
        self.spanning_tree(g, bound, true)
    }

    fn spanning_tree(&mut self, g: GraphId, bound: u64, strict: bool) -> Result<Lit> {
        self.add_predicate(
            g,
            Predicate::SpanningTree {
                bound: Bound::Const(bound),
                strict,
            },
        )
    }

    // ===== Solving =====

    /// Give up on limited solves after `conflicts` conflicts (0 = unlimited).
    pub fn set_conflict_limit(&mut self, conflicts: u64) {
        self.config.limits.conflicts = conflicts;
    }

    /// Give up on limited solves after `propagations` propagations (0 = unlimited).
    pub fn set_propagation_limit(&mut self, propagations: u64) {
        self.config.limits.propagations = propagations;
    }

    /// Give up on limited solves after `secs` seconds (0 = unlimited).
    pub fn set_time_limit(&mut self, secs: u64) {
        self.config.limits.time_secs = secs;
    }

    /// Solve; `Ok(false)` means unsatisfiable.
    ///
    /// Runs without resource limits.
    pub fn solve(&mut self) -> Result<bool> {
        self.solve_assumptions(&[])
    }

    /// Solve under assumptions, without resource limits.
    ///
    /// After `Ok(false)`, [`Self::conflict_clause`] holds negated assumptions
    /// that cannot all hold together.
    pub fn solve_assumptions(&mut self, assumptions: &[Lit]) -> Result<bool> {
        match self.search(assumptions, Budget::unlimited())? {
            SolveResult::Sat => Ok(true),
            SolveResult::Unsat => Ok(false),
            SolveResult::Unknown => Err(Error::SolveFailed(
                "theory refinement round limit reached".to_string(),
            )),
        }
    }

    /// Solve under assumptions within the configured resource limits.
    pub fn solve_limited(&mut self, assumptions: &[Lit]) -> Result<SolveResult> {
        let budget = self.limited_budget();
        self.search(assumptions, budget)
    }

    pub(crate) fn limited_budget(&self) -> Budget {
        Budget::from_limits(&self.config.limits, &self.sat)
    }

    /// Lazy refinement loop: solve the Boolean abstraction, check every
    /// graph on the model, add the lemmas and repeat until no lemma is
    /// produced.
    pub(crate) fn search(&mut self, assumptions: &[Lit], budget: Budget) -> Result<SolveResult> {
        self.check_lits(assumptions)?;
        self.model = None;
        self.conflict.clear();
        self.optimal = true;
        self.stats.solves += 1;

        let mut rounds = 0u64;
        let result = loop {
            if !budget.arm(&mut self.sat) {
                break SolveResult::Unknown;
            }
            match self.sat.solve_with_assumptions(assumptions) {
                SolverResult::Sat => {}
                SolverResult::Unsat => {
                    self.conflict = self.sat.conflict().to_vec();
                    break SolveResult::Unsat;
                }
                SolverResult::Unknown => break SolveResult::Unknown,
            }

            let model = self.sat.model().to_vec();
            let lemmas = self.check_theories(&model)?;
            if lemmas.is_empty() {
                self.model = Some(model);
                break SolveResult::Sat;
            }

            rounds += 1;
            self.stats.theory_rounds += 1;
            self.stats.theory_lemmas += lemmas.len() as u64;
            debug!(round = rounds, lemmas = lemmas.len(), "theory refinement");
            for lemma in lemmas {
                self.sat.add_clause(lemma);
            }
            if self.config.max_theory_rounds > 0 && rounds >= self.config.max_theory_rounds {
                break SolveResult::Unknown;
            }
        };
        self.sat.budget_off();

        let sat_stats = self.sat.stats();
        info!(
            %result,
            rounds,
            conflicts = sat_stats.conflicts,
            decisions = sat_stats.decisions,
            "solve finished"
        );
        Ok(result)
    }

    fn check_theories(&mut self, model: &[LBool]) -> Result<Vec<Lemma>> {
        let mut env = TheoryEnv {
            sat: &mut self.sat,
            bv: &mut self.bv,
        };
        let mut lemmas = Vec::new();
        for graph in &mut self.graphs {
            if let TheoryResult::Lemmas(found) = graph.check(model, &mut env)? {
                debug!(theory = graph.name(), graph = graph.id().id(), lemmas = found.len(), "lemmas");
                lemmas.extend(found);
            }
        }
        Ok(lemmas)
    }

    pub(crate) fn set_optimal(&mut self, optimal: bool) {
        self.optimal = optimal;
    }

    pub(crate) fn take_model(&mut self) -> Option<Vec<LBool>> {
        self.model.take()
    }

    pub(crate) fn restore_model(&mut self, model: Vec<LBool>) {
        self.model = Some(model);
        self.conflict.clear();
    }

    /// False if the last minimisation stopped at a resource limit.
    #[must_use]
    pub fn last_solution_was_optimal(&self) -> bool {
        self.optimal
    }

    /// Negated assumptions responsible for the last unsatisfiable answer.
    ///
    /// Empty if the problem is unsatisfiable without any assumption.
    #[must_use]
    pub fn conflict_clause(&self) -> &[Lit] {
        &self.conflict
    }

    // ===== Model queries =====

    fn model(&self) -> Result<&[LBool]> {
        self.model.as_deref().ok_or(Error::NoModel)
    }

    /// Value of `lit` in the last model; `None` if it was left unassigned.
    pub fn lit_value(&self, lit: Lit) -> Result<Option<bool>> {
        self.check_lit(lit)?;
        Ok(model_value(self.model()?, lit).to_option())
    }

    /// Value of a bitvector in the last model.
    pub fn bv_value(&self, id: BvId) -> Result<u64> {
        self.bv.value(self.model()?, id)
    }

    /// Largest value of a bitvector consistent with the last model.
    ///
    /// Differs from [`Self::bv_value`] only when some of its bits were left
    /// unassigned, which happens once their variables are excluded from
    /// decisions.
    pub fn bv_max_value(&self, id: BvId) -> Result<u64> {
        self.bv.upper_value(self.model()?, id)
    }

    pub(crate) fn bv_model_value(&self, model: &[LBool], id: BvId) -> Result<u64> {
        self.bv.value(model, id)
    }

    fn owner(&self, lit: Lit) -> Result<&GraphTheory> {
        let g = self
            .graph_lits
            .get(&lit.var())
            .ok_or(Error::NotAGraphLiteral(lit.var().id()))?;
        self.graph(*g)
    }

    /// Nodes of a shortest path witnessing a reach/distance literal.
    pub fn path_nodes(&self, lit: Lit) -> Result<Option<Vec<NodeId>>> {
        self.owner(lit)?.path_nodes(self.model()?, &self.bv, lit)
    }

    /// Edge literals of a shortest path witnessing a reach/distance literal.
    pub fn path_edge_lits(&self, lit: Lit) -> Result<Option<Vec<Lit>>> {
        self.owner(lit)?.path_edges(self.model()?, &self.bv, lit)
    }

    /// Length of the shortest path for a reach/distance literal; `None` if unreachable.
    pub fn path_length(&self, lit: Lit) -> Result<Option<u64>> {
        self.owner(lit)?.path_length(self.model()?, &self.bv, lit)
    }

    /// Weight of the minimum spanning tree for a spanning tree literal.
    ///
    /// `None` when the enabled edges of the last model leave the graph
    /// disconnected.
    pub fn min_spanning_tree_weight(&self, lit: Lit) -> Result<Option<u64>> {
        self.owner(lit)?
            .spanning_tree_weight(self.model()?, &self.bv, lit)
    }

    /// Maximum flow value of a flow literal's network in the last model.
    pub fn max_flow_value(&self, flow_lit: Lit) -> Result<u64> {
        self.owner(flow_lit)?
            .max_flow_value(self.model()?, &self.bv, flow_lit)
    }

    /// Flow on an edge in a maximum flow of a flow literal's network.
    pub fn edge_flow(&self, flow_lit: Lit, edge_lit: Lit) -> Result<u64> {
        self.owner(flow_lit)?
            .edge_flow(self.model()?, &self.bv, flow_lit, edge_lit)
    }

    /// Number of SAT variables
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.sat.num_vars()
    }

    /// Number of problem clauses (theory lemmas included).
    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.sat.num_clauses()
    }

    /// Statistics
    #[must_use]
    pub fn stats(&self) -> Statistics {
        let sat = self.sat.stats();
        Statistics {
            decisions: sat.decisions,
            propagations: sat.propagations,
            conflicts: sat.conflicts,
            restarts: sat.restarts,
            learnt_clauses: sat.learnt_clauses,
            ..self.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_gates() {
        let mut ctx = Context::new();
        let a = ctx.new_lit();
        let b = ctx.new_lit();
        let both = ctx.and(a, b).unwrap();
        let either = ctx.or(a, b).unwrap();
        let diff = ctx.xor(a, b).unwrap();
        ctx.assert_lit(either).unwrap();
        ctx.assert_lit(!both).unwrap();
        ctx.assert_lit(a).unwrap();
        assert!(ctx.solve().unwrap());
        assert_eq!(ctx.lit_value(b).unwrap(), Some(false));
        assert_eq!(ctx.lit_value(diff).unwrap(), Some(true));
        assert_eq!(ctx.lit_value(ctx.true_lit()).unwrap(), Some(true));
    }

    #[test]
    fn test_equiv_and_implies() {
        let mut ctx = Context::new();
        let a = ctx.new_lit();
        let b = ctx.new_lit();
        let same = ctx.equiv(a, b).unwrap();
        let imp = ctx.implies(a, b).unwrap();
        ctx.assert_lit(same).unwrap();
        ctx.assert_lit(a).unwrap();
        assert!(ctx.solve().unwrap());
        assert_eq!(ctx.lit_value(b).unwrap(), Some(true));
        assert_eq!(ctx.lit_value(imp).unwrap(), Some(true));
    }

    #[test]
    fn test_at_most_one() {
        let mut ctx = Context::new();
        let lits: Vec<Lit> = (0..9).map(|_| ctx.new_lit()).collect();
        ctx.at_most_one(&lits).unwrap();
        ctx.assert_lit(lits[3]).unwrap();
        assert!(ctx.solve().unwrap());
        for (i, &lit) in lits.iter().enumerate() {
            assert_eq!(ctx.lit_value(lit).unwrap(), Some(i == 3));
        }
        ctx.assert_lit(lits[7]).unwrap();
        assert!(!ctx.solve().unwrap());
    }

    #[test]
    fn test_decision_priority() {
        let mut ctx = Context::new();
        let a = ctx.new_lit();
        assert_eq!(ctx.decision_priority(a.var()), Ok(0));
        ctx.set_decision_priority(a.var(), 3).unwrap();
        assert_eq!(ctx.decision_priority(a.var()), Ok(3));
        assert_eq!(
            ctx.set_decision_priority(Var::new(500), 1),
            Err(Error::UnknownVariable(500))
        );
    }

    #[test]
    fn test_bv_constant_arithmetic() {
        let mut ctx = Context::new();
        let x = ctx.new_bv(4).unwrap();
        let up = ctx.bv_add_const(x, 3).unwrap();
        let down = ctx.bv_sub_const(x, 2).unwrap();
        let ten = ctx.bv_compare_const(Comparison::Eq, up, 10).unwrap();
        ctx.assert_lit(ten).unwrap();
        assert!(ctx.solve().unwrap());
        assert_eq!(ctx.bv_value(x).unwrap(), 7);
        assert_eq!(ctx.bv_value(down).unwrap(), 5);
        assert_eq!(
            ctx.bv_add_const(x, 16),
            Err(Error::ConstantOutOfRange { value: 16, width: 4 })
        );
    }

    #[test]
    fn test_bv_max_value_of_undecided_bits() {
        let mut ctx = Context::new();
        let x = ctx.new_bv(3).unwrap();
        let bits = ctx.bv_bits(x).unwrap().to_vec();
        for bit in &bits {
            ctx.set_decision_var(bit.var(), false).unwrap();
        }
        ctx.assert_lit(bits[0]).unwrap();
        assert!(ctx.solve().unwrap());
        assert_eq!(ctx.bv_value(x).unwrap(), 1);
        assert_eq!(ctx.bv_max_value(x).unwrap(), 7);
    }

    #[test]
    fn test_unknown_handles() {
        let mut ctx = Context::new();
        let bogus = Lit::pos(Var::new(1000));
        assert_eq!(ctx.add_clause(&[bogus]), Err(Error::UnknownVariable(1000)));
        assert_eq!(ctx.add_node(GraphId::new(3)), Err(Error::UnknownGraph(3)));
        assert_eq!(ctx.bv_width(BvId::new(0)), Err(Error::UnknownBitvector(0)));
        assert_eq!(ctx.new_bv(0), Err(Error::InvalidWidth { width: 0 }));
        assert_eq!(
            ctx.bv_const(4, 16),
            Err(Error::ConstantOutOfRange { value: 16, width: 4 })
        );

        let g = ctx.new_graph();
        let a = ctx.add_node(g).unwrap();
        assert_eq!(
            ctx.add_edge(g, a, NodeId::new(5), 1),
            Err(Error::UnknownNode { graph: 0, node: 5 })
        );
        let w = ctx.new_bv(4).unwrap();
        let v = ctx.new_bv(5).unwrap();
        assert_eq!(
            ctx.bv_add(w, v),
            Err(Error::WidthMismatch { left: 4, right: 5 })
        );
    }

    #[test]
    fn test_model_queries_need_a_model() {
        let mut ctx = Context::new();
        let w = ctx.new_bv(3).unwrap();
        assert_eq!(ctx.bv_value(w), Err(Error::NoModel));
        let lit = ctx.new_lit();
        ctx.assert_lit(lit).unwrap();
        ctx.assert_lit(!lit).unwrap();
        assert!(!ctx.solve().unwrap());
        assert_eq!(ctx.lit_value(lit), Err(Error::NoModel));
        assert!(ctx.conflict_clause().is_empty());
    }

    #[test]
    fn test_not_a_graph_literal() {
        let mut ctx = Context::new();
        let lit = ctx.new_lit();
        assert!(ctx.solve().unwrap());
        assert_eq!(
            ctx.path_nodes(lit),
            Err(Error::NotAGraphLiteral(lit.var().id()))
        );
    }

    #[test]
    fn test_conflict_limit_gives_unknown() {
        // Pigeonhole: 6 pigeons, 5 holes
        let mut ctx = Context::new();
        let holes = 5;
        let p: Vec<Vec<Lit>> = (0..=holes)
            .map(|_| (0..holes).map(|_| ctx.new_lit()).collect())
            .collect();
        for row in &p {
            ctx.add_clause(row).unwrap();
        }
        for h in 0..holes {
            let column: Vec<Lit> = p.iter().map(|row| row[h]).collect();
            ctx.at_most_one(&column).unwrap();
        }
        ctx.set_conflict_limit(1);
        assert_eq!(ctx.solve_limited(&[]).unwrap(), SolveResult::Unknown);
        assert_eq!(ctx.lit_value(p[0][0]), Err(Error::NoModel));

        ctx.set_conflict_limit(0);
        assert_eq!(ctx.solve_limited(&[]).unwrap(), SolveResult::Unsat);
    }

    #[test]
    fn test_stats_count_rounds() {
        let mut ctx = Context::new();
        let g = ctx.new_graph();
        let a = ctx.add_node(g).unwrap();
        let b = ctx.add_node(g).unwrap();
        ctx.add_edge(g, a, b, 1).unwrap();
        let r = ctx.reaches(g, a, b).unwrap();
        ctx.assert_lit(r).unwrap();
        assert!(ctx.solve().unwrap());
        let stats = ctx.stats();
        assert_eq!(stats.solves, 1);
        assert!(stats.theory_lemmas >= stats.theory_rounds);
    }

    #[test]
    fn test_sat_config_copies_every_field() {
        let params = SatParams {
            random_seed: 17,
            phase_saving: false,
            ..SatParams::default()
        };
        let config = sat_config(&params);
        assert_eq!(config.random_seed, 17);
        assert!(!config.phase_saving);
        assert_eq!(config.var_decay, params.var_decay);
    }
}
