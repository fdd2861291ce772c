//! CDCL SAT solver
//!
//! A MiniSat-style conflict-driven clause-learning solver:
//! - two watched literals with blocker literals
//! - VSIDS decision heuristic with phase saving and seeded random decisions
//! - first-UIP learning with local clause minimisation
//! - Luby restarts and activity-based learnt clause reduction
//! - incremental solving under assumptions with final conflict extraction
//! - conflict, propagation and wall-clock budgets

use crate::clause::{ClauseDatabase, ClauseId};
use crate::config::SolverConfig;
use crate::literal::{LBool, Lit, Var};
use crate::order::VarOrder;
use crate::restart::restart_interval;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;
use std::time::Instant;

/// Result of a solve call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverResult {
    /// A satisfying assignment was found
    Sat,
    /// No satisfying assignment exists (under the assumptions)
    Unsat,
    /// A budget was exhausted before an answer was found
    Unknown,
}

/// Search statistics, cumulative over all solve calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// Number of solve calls
    pub solves: u64,
    /// Decisions made
    pub decisions: u64,
    /// Literals propagated
    pub propagations: u64,
    /// Conflicts encountered
    pub conflicts: u64,
    /// Restarts performed
    pub restarts: u64,
    /// Clauses learnt
    pub learnt_clauses: u64,
    /// Learnt clauses removed by database reduction
    pub removed_clauses: u64,
}

/// Watch list entry
#[derive(Debug, Clone, Copy)]
pub(crate) struct Watcher {
    pub(crate) clause: ClauseId,
    /// Some other literal of the clause; if true the clause need not be visited
    pub(crate) blocker: Lit,
}

/// CDCL SAT solver
#[derive(Debug)]
pub struct Solver {
    config: SolverConfig,
    clauses: ClauseDatabase,
    problem: Vec<ClauseId>,
    learnts: Vec<ClauseId>,
    /// `watches[l]` holds the clauses watching `l`; visited when `l` becomes false
    watches: Vec<Vec<Watcher>>,

    assigns: Vec<LBool>,
    level: Vec<u32>,
    reason: Vec<Option<ClauseId>>,
    trail: Vec<Lit>,
    trail_lim: Vec<usize>,
    qhead: usize,

    activity: Vec<f64>,
    var_inc: f64,
    clause_inc: f64,
    order: VarOrder,
    phase: Vec<bool>,
    user_phase: Vec<Option<bool>>,
    decision: Vec<bool>,
    seen: Vec<bool>,
    rng: StdRng,

    assumptions: Vec<Lit>,
    conflict: Vec<Lit>,
    model: Vec<LBool>,
    ok: bool,

    max_learnts: f64,
    conflict_budget: Option<u64>,
    propagation_budget: Option<u64>,
    deadline: Option<Instant>,
    conflict_limit: u64,
    propagation_limit: u64,

    stats: SolverStats,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create a solver with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    /// Create a solver with a custom configuration
    #[must_use]
    pub fn with_config(config: SolverConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.random_seed);
        Self {
            config,
            clauses: ClauseDatabase::new(),
            problem: Vec::new(),
            learnts: Vec::new(),
            watches: Vec::new(),
            assigns: Vec::new(),
            level: Vec::new(),
            reason: Vec::new(),
            trail: Vec::new(),
            trail_lim: Vec::new(),
            qhead: 0,
            activity: Vec::new(),
            var_inc: 1.0,
            clause_inc: 1.0,
            order: VarOrder::new(),
            phase: Vec::new(),
            user_phase: Vec::new(),
            decision: Vec::new(),
            seen: Vec::new(),
            rng,
            assumptions: Vec::new(),
            conflict: Vec::new(),
            model: Vec::new(),
            ok: true,
            max_learnts: 0.0,
            conflict_budget: None,
            propagation_budget: None,
            deadline: None,
            conflict_limit: u64::MAX,
            propagation_limit: u64::MAX,
            stats: SolverStats::default(),
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Allocate a fresh variable
    pub fn new_var(&mut self) -> Var {
        let var = Var::new(self.assigns.len() as u32);
        self.assigns.push(LBool::Undef);
        self.level.push(0);
        self.reason.push(None);
        self.activity.push(0.0);
        let initial_phase = self.config.random_initial_phase && self.rng.random::<bool>();
        self.phase.push(initial_phase);
        self.user_phase.push(None);
        self.decision.push(true);
        self.seen.push(false);
        self.watches.push(Vec::new());
        self.watches.push(Vec::new());
        self.order.insert(var, &self.activity);
        var
    }

    /// Number of allocated variables
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.assigns.len()
    }

    /// Number of problem clauses with two or more literals
    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.problem.len()
    }

    /// Number of learnt clauses currently kept
    #[must_use]
    pub fn num_learnts(&self) -> usize {
        self.learnts.len()
    }

    /// Statistics
    #[must_use]
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// False once the clause set is known to be unsatisfiable
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Force the decision polarity of `var`
    pub fn set_polarity(&mut self, var: Var, positive: bool) {
        self.ensure_var(var);
        self.user_phase[var.index()] = Some(positive);
    }

    /// Current forced polarity of `var`, if any
    #[must_use]
    pub fn polarity(&self, var: Var) -> Option<bool> {
        self.user_phase.get(var.index()).copied().flatten()
    }

    /// Allow or forbid branching on `var`
    pub fn set_decision_var(&mut self, var: Var, decision: bool) {
        self.ensure_var(var);
        self.decision[var.index()] = decision;
        if decision && self.assigns[var.index()].is_undef() {
            self.order.insert(var, &self.activity);
        }
    }

    /// True if the solver may branch on `var`
    #[must_use]
    pub fn is_decision_var(&self, var: Var) -> bool {
        self.decision.get(var.index()).copied().unwrap_or(false)
    }

    /// Set the decision priority of `var`.
    ///
    /// Unassigned variables of a higher priority are always branched on
    /// before those of a lower one; VSIDS activity orders variables of equal
    /// priority. The default priority is 0.
    pub fn set_decision_priority(&mut self, var: Var, priority: i32) {
        self.ensure_var(var);
        self.order.set_priority(var, priority, &self.activity);
    }

    /// Decision priority of `var`
    #[must_use]
    pub fn decision_priority(&self, var: Var) -> i32 {
        self.order.priority(var)
    }

    /// Limit the conflicts of each following solve call (`None` = unlimited)
    pub fn set_conflict_budget(&mut self, budget: Option<u64>) {
        self.conflict_budget = budget;
    }

    /// Limit the propagations of each following solve call (`None` = unlimited)
    pub fn set_propagation_budget(&mut self, budget: Option<u64>) {
        self.propagation_budget = budget;
    }

    /// Stop searching at `deadline` (`None` = never)
    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    /// Remove every budget
    pub fn budget_off(&mut self) {
        self.conflict_budget = None;
        self.propagation_budget = None;
        self.deadline = None;
    }

    /// Add a clause. Returns `false` once the clause set is unsatisfiable.
    ///
    /// Variables referenced by the clause are allocated on demand.
    pub fn add_clause(&mut self, lits: impl IntoIterator<Item = Lit>) -> bool {
        if !self.ok {
            return false;
        }
        self.cancel_until(0);

        let mut ps: SmallVec<[Lit; 8]> = lits.into_iter().collect();
        for &lit in &ps {
            self.ensure_var(lit.var());
        }
        ps.sort_unstable();
        ps.dedup();

        let mut out: SmallVec<[Lit; 8]> = SmallVec::new();
        for &lit in &ps {
            let value = self.lit_value(lit);
            if value.is_true() || out.last() == Some(&!lit) {
                return true;
            }
            if value.is_undef() {
                out.push(lit);
            }
        }

        match out.len() {
            0 => {
                self.ok = false;
                false
            }
            1 => {
                self.unchecked_enqueue(out[0], None);
                self.ok = self.propagate().is_none();
                self.ok
            }
            _ => {
                let id = self.clauses.alloc(out, false);
                self.problem.push(id);
                self.attach(id);
                true
            }
        }
    }

    /// Add a clause of DIMACS literals (1-based, negative for negation)
    pub fn add_clause_dimacs(&mut self, lits: &[i32]) -> bool {
        self.add_clause(lits.iter().filter(|&&l| l != 0).map(|&l| Lit::from_dimacs(l)))
    }

    /// Solve without assumptions
    pub fn solve(&mut self) -> SolverResult {
        self.solve_with_assumptions(&[])
    }

    /// Solve under the given assumptions.
    ///
    /// On `Unsat` with a non-empty [`Self::conflict`], the formula is only
    /// unsatisfiable together with those assumptions.
    pub fn solve_with_assumptions(&mut self, assumptions: &[Lit]) -> SolverResult {
        self.stats.solves += 1;
        self.model.clear();
        self.conflict.clear();
        if !self.ok {
            return SolverResult::Unsat;
        }
        for &lit in assumptions {
            self.ensure_var(lit.var());
        }
        self.cancel_until(0);
        self.assumptions = assumptions.to_vec();

        self.conflict_limit = self
            .conflict_budget
            .map_or(u64::MAX, |b| self.stats.conflicts.saturating_add(b));
        self.propagation_limit = self
            .propagation_budget
            .map_or(u64::MAX, |b| self.stats.propagations.saturating_add(b));
        self.max_learnts = (self.problem.len() as f64 * self.config.learntsize_factor).max(100.0);

        let mut status = LBool::Undef;
        let mut restarts = 0u64;
        while status.is_undef() {
            let interval = restart_interval(
                self.config.restart_first,
                self.config.restart_inc,
                self.config.luby_restart,
                restarts,
            );
            status = self.search(interval.max(1));
            if !self.within_budget() {
                break;
            }
            if status.is_undef() {
                restarts += 1;
                self.stats.restarts += 1;
            }
        }

        let result = match status {
            LBool::True => {
                self.model = self.assigns.clone();
                SolverResult::Sat
            }
            LBool::False => {
                if self.conflict.is_empty() {
                    self.ok = false;
                }
                SolverResult::Unsat
            }
            LBool::Undef => SolverResult::Unknown,
        };
        self.cancel_until(0);
        self.assumptions.clear();
        result
    }

    /// Model of the last `Sat` answer, indexed by variable
    #[must_use]
    pub fn model(&self) -> &[LBool] {
        &self.model
    }

    /// Value of `lit` in the last model
    #[must_use]
    pub fn model_value(&self, lit: Lit) -> LBool {
        self.model
            .get(lit.var().index())
            .copied()
            .unwrap_or(LBool::Undef)
            .xor(lit.is_neg())
    }

    /// Clause of negated assumptions explaining the last `Unsat` answer
    #[must_use]
    pub fn conflict(&self) -> &[Lit] {
        &self.conflict
    }

    /// Value of `lit` fixed at decision level 0
    #[must_use]
    pub fn fixed_value(&self, lit: Lit) -> LBool {
        if lit.var().index() >= self.assigns.len() || self.level[lit.var().index()] != 0 {
            return LBool::Undef;
        }
        self.lit_value(lit)
    }

    // ===== Accessors for invariant checks =====

    pub(crate) fn clause_ids(&self) -> impl Iterator<Item = ClauseId> + '_ {
        self.problem.iter().chain(self.learnts.iter()).copied()
    }

    pub(crate) fn clause_db(&self) -> &ClauseDatabase {
        &self.clauses
    }

    pub(crate) fn watch_list(&self, lit: Lit) -> &[Watcher] {
        &self.watches[lit.index()]
    }

    pub(crate) fn trail(&self) -> &[Lit] {
        &self.trail
    }

    pub(crate) fn reason_of(&self, var: Var) -> Option<ClauseId> {
        self.reason[var.index()]
    }

    pub(crate) fn lit_value(&self, lit: Lit) -> LBool {
        self.assigns[lit.var().index()].xor(lit.is_neg())
    }

    // ===== Search =====

    fn ensure_var(&mut self, var: Var) {
        while self.num_vars() <= var.index() {
            self.new_var();
        }
    }

    fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn within_budget(&self) -> bool {
        self.stats.conflicts < self.conflict_limit
            && self.stats.propagations < self.propagation_limit
            && self.deadline.is_none_or(|d| Instant::now() < d)
    }

    fn attach(&mut self, id: ClauseId) {
        let clause = self.clauses.get(id);
        let (a, b) = (clause.lits[0], clause.lits[1]);
        self.watches[a.index()].push(Watcher {
            clause: id,
            blocker: b,
        });
        self.watches[b.index()].push(Watcher {
            clause: id,
            blocker: a,
        });
    }

    fn unchecked_enqueue(&mut self, lit: Lit, reason: Option<ClauseId>) {
        let v = lit.var().index();
        debug_assert!(self.assigns[v].is_undef());
        self.assigns[v] = LBool::from_bool(lit.is_pos());
        self.level[v] = self.decision_level();
        self.reason[v] = reason;
        self.trail.push(lit);
    }

    fn new_decision_level(&mut self) {
        self.trail_lim.push(self.trail.len());
    }

    fn cancel_until(&mut self, level: u32) {
        if self.decision_level() <= level {
            return;
        }
        let start = self.trail_lim[level as usize];
        for i in (start..self.trail.len()).rev() {
            let lit = self.trail[i];
            let v = lit.var();
            self.assigns[v.index()] = LBool::Undef;
            self.reason[v.index()] = None;
            if self.config.phase_saving {
                self.phase[v.index()] = lit.is_pos();
            }
            if self.decision[v.index()] {
                self.order.insert(v, &self.activity);
            }
        }
        self.qhead = start;
        self.trail.truncate(start);
        self.trail_lim.truncate(level as usize);
    }

    /// Unit propagation; returns the conflicting clause, if any
    fn propagate(&mut self) -> Option<ClauseId> {
        let mut conflict = None;

        while self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            self.stats.propagations += 1;
            let false_lit = !p;

            let mut ws = std::mem::take(&mut self.watches[false_lit.index()]);
            let mut i = 0;
            let mut j = 0;

            while i < ws.len() {
                let w = ws[i];
                i += 1;

                if self.assigns[w.blocker.var().index()].xor(w.blocker.is_neg()).is_true() {
                    ws[j] = w;
                    j += 1;
                    continue;
                }

                let clause = self.clauses.get_mut(w.clause);
                if clause.deleted {
                    continue;
                }
                if clause.lits[0] == false_lit {
                    clause.lits.swap(0, 1);
                }
                debug_assert_eq!(clause.lits[1], false_lit);

                let first = clause.lits[0];
                let rewatched = Watcher {
                    clause: w.clause,
                    blocker: first,
                };
                let first_value = self.assigns[first.var().index()].xor(first.is_neg());
                if first != w.blocker && first_value.is_true() {
                    ws[j] = rewatched;
                    j += 1;
                    continue;
                }

                // Look for a new literal to watch
                let mut moved = false;
                for k in 2..clause.lits.len() {
                    let lit = clause.lits[k];
                    if !self.assigns[lit.var().index()].xor(lit.is_neg()).is_false() {
                        clause.lits.swap(1, k);
                        self.watches[lit.index()].push(rewatched);
                        moved = true;
                        break;
                    }
                }
                if moved {
                    continue;
                }

                ws[j] = rewatched;
                j += 1;
                if first_value.is_false() {
                    conflict = Some(w.clause);
                    self.qhead = self.trail.len();
                    while i < ws.len() {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.unchecked_enqueue(first, Some(w.clause));
                }
            }

            ws.truncate(j);
            self.watches[false_lit.index()] = ws;
            if conflict.is_some() {
                break;
            }
        }

        conflict
    }

    /// First-UIP conflict analysis; returns the learnt clause and backtrack level
    fn analyze(&mut self, conflict: ClauseId) -> (SmallVec<[Lit; 16]>, u32) {
        let mut learnt: SmallVec<[Lit; 16]> = SmallVec::new();
        learnt.push(Lit::pos(Var::new(0)));

        let current = self.decision_level();
        let mut path_count = 0usize;
        let mut pivot: Option<Lit> = None;
        let mut index = self.trail.len();
        let mut confl = Some(conflict);

        loop {
            let Some(cref) = confl else {
                break;
            };
            if self.clauses.get(cref).learnt {
                self.bump_clause(cref);
            }

            let start = usize::from(pivot.is_some());
            let lits: SmallVec<[Lit; 16]> =
                self.clauses.get(cref).lits[start..].iter().copied().collect();
            for q in lits {
                let v = q.var().index();
                if !self.seen[v] && self.level[v] > 0 {
                    self.bump_var(q.var());
                    self.seen[v] = true;
                    if self.level[v] >= current {
                        path_count += 1;
                    } else {
                        learnt.push(q);
                    }
                }
            }

            // Next literal of the current level on the trail
            loop {
                index -= 1;
                if self.seen[self.trail[index].var().index()] {
                    break;
                }
            }
            let p = self.trail[index];
            confl = self.reason[p.var().index()];
            self.seen[p.var().index()] = false;
            pivot = Some(p);
            path_count -= 1;
            if path_count == 0 {
                break;
            }
        }

        if let Some(p) = pivot {
            learnt[0] = !p;
        }

        // Local minimisation: drop literals implied by other literals of the clause
        let to_clear: SmallVec<[Lit; 16]> = learnt.clone();
        let mut kept: SmallVec<[Lit; 16]> = SmallVec::new();
        kept.push(learnt[0]);
        for &lit in &learnt[1..] {
            let redundant = self.reason[lit.var().index()].is_some_and(|r| {
                self.clauses.get(r).lits[1..].iter().all(|q| {
                    let v = q.var().index();
                    self.seen[v] || self.level[v] == 0
                })
            });
            if !redundant {
                kept.push(lit);
            }
        }
        for lit in to_clear {
            self.seen[lit.var().index()] = false;
        }

        let backtrack = if kept.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            for i in 2..kept.len() {
                if self.level[kept[i].var().index()] > self.level[kept[max_i].var().index()] {
                    max_i = i;
                }
            }
            kept.swap(1, max_i);
            self.level[kept[1].var().index()]
        };

        (kept, backtrack)
    }

    /// Express the failure of assumption `p` in terms of assumptions
    fn analyze_final(&mut self, p: Lit) {
        self.conflict.clear();
        self.conflict.push(p);
        if self.decision_level() == 0 {
            return;
        }

        self.seen[p.var().index()] = true;
        let start = self.trail_lim[0];
        for i in (start..self.trail.len()).rev() {
            let lit = self.trail[i];
            let v = lit.var().index();
            if !self.seen[v] {
                continue;
            }
            match self.reason[v] {
                None => {
                    debug_assert!(self.level[v] > 0);
                    self.conflict.push(!lit);
                }
                Some(r) => {
                    let clause = self.clauses.get(r);
                    for q in &clause.lits[1..] {
                        if self.level[q.var().index()] > 0 {
                            self.seen[q.var().index()] = true;
                        }
                    }
                }
            }
            self.seen[v] = false;
        }
        self.seen[p.var().index()] = false;
    }

    fn search(&mut self, max_conflicts: u64) -> LBool {
        let mut conflicts = 0u64;

        loop {
            if let Some(confl) = self.propagate() {
                self.stats.conflicts += 1;
                conflicts += 1;
                if self.decision_level() == 0 {
                    return LBool::False;
                }

                let (learnt, backtrack) = self.analyze(confl);
                self.cancel_until(backtrack);
                if learnt.len() == 1 {
                    self.unchecked_enqueue(learnt[0], None);
                } else {
                    let asserting = learnt[0];
                    let id = self.clauses.alloc(learnt, true);
                    self.learnts.push(id);
                    self.attach(id);
                    self.bump_clause(id);
                    self.unchecked_enqueue(asserting, Some(id));
                }
                self.stats.learnt_clauses += 1;
                self.var_inc /= self.config.var_decay;
                self.clause_inc /= self.config.clause_decay;
                continue;
            }

            if conflicts >= max_conflicts || !self.within_budget() {
                self.cancel_until(0);
                return LBool::Undef;
            }

            if self.learnts.len() as f64 - self.trail.len() as f64 >= self.max_learnts {
                self.reduce_db();
                self.max_learnts *= self.config.learntsize_inc;
            }

            let mut next = None;
            while (self.decision_level() as usize) < self.assumptions.len() {
                let p = self.assumptions[self.decision_level() as usize];
                match self.lit_value(p) {
                    LBool::True => self.new_decision_level(),
                    LBool::False => {
                        self.analyze_final(!p);
                        return LBool::False;
                    }
                    LBool::Undef => {
                        next = Some(p);
                        break;
                    }
                }
            }

            let next = match next {
                Some(p) => p,
                None => {
                    self.stats.decisions += 1;
                    match self.pick_branch_lit() {
                        Some(p) => p,
                        None => return LBool::True,
                    }
                }
            };
            self.new_decision_level();
            self.unchecked_enqueue(next, None);
        }
    }

    fn pick_branch_lit(&mut self) -> Option<Lit> {
        let mut next: Option<Var> = None;

        if self.config.random_var_freq > 0.0
            && !self.order.is_empty()
            && self.rng.random::<f64>() < self.config.random_var_freq
        {
            let v = self.order.get(self.rng.random_range(0..self.order.len()));
            if self.assigns[v.index()].is_undef() && self.decision[v.index()] {
                next = Some(v);
            }
        }

        while next.is_none_or(|v| !self.assigns[v.index()].is_undef() || !self.decision[v.index()])
        {
            next = Some(self.order.pop_max(&self.activity)?);
        }

        let v = next?;
        let positive = self.user_phase[v.index()].unwrap_or(self.phase[v.index()]);
        Some(Lit::new(v, positive))
    }

    fn bump_var(&mut self, var: Var) {
        let v = var.index();
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            for a in &mut self.activity {
                *a *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }
        self.order.increased(var, &self.activity);
    }

    fn bump_clause(&mut self, id: ClauseId) {
        let clause = self.clauses.get_mut(id);
        clause.activity += self.clause_inc;
        if clause.activity > 1e20 {
            for &l in &self.learnts {
                self.clauses.get_mut(l).activity *= 1e-20;
            }
            self.clause_inc *= 1e-20;
        }
    }

    fn is_locked(&self, id: ClauseId) -> bool {
        let first = self.clauses.get(id).lits[0];
        self.reason[first.var().index()] == Some(id) && self.lit_value(first).is_true()
    }

    /// Remove about half of the learnt clauses, least active first
    fn reduce_db(&mut self) {
        let extra_lim = self.clause_inc / self.learnts.len().max(1) as f64;
        let mut learnts = std::mem::take(&mut self.learnts);
        learnts.sort_by(|&a, &b| {
            let ca = self.clauses.get(a);
            let cb = self.clauses.get(b);
            (ca.len() > 2, ca.activity)
                .partial_cmp(&(cb.len() > 2, cb.activity))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let half = learnts.len() / 2;
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(learnts.len());
        for (i, id) in learnts.into_iter().enumerate() {
            let clause = self.clauses.get(id);
            let removable = clause.len() > 2
                && !self.is_locked(id)
                && (i < half || clause.activity < extra_lim);
            if removable {
                self.clauses.mark_deleted(id);
                removed.push(id);
            } else {
                kept.push(id);
            }
        }
        self.learnts = kept;

        if !removed.is_empty() {
            let clauses = &self.clauses;
            for ws in &mut self.watches {
                ws.retain(|w| !clauses.get(w.clause).deleted);
            }
            self.stats.removed_clauses += removed.len() as u64;
            self.clauses.release(removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(solver: &mut Solver, n: usize) -> Vec<Var> {
        (0..n).map(|_| solver.new_var()).collect()
    }

    #[test]
    fn test_empty_formula_is_sat() {
        let mut solver = Solver::new();
        assert_eq!(solver.solve(), SolverResult::Sat);
    }

    #[test]
    fn test_unit_propagation_at_root() {
        let mut solver = Solver::new();
        let v = lits(&mut solver, 3);
        assert!(solver.add_clause([Lit::pos(v[0])]));
        assert!(solver.add_clause([Lit::neg(v[0]), Lit::pos(v[1])]));
        assert!(solver.add_clause([Lit::neg(v[1]), Lit::neg(v[2])]));

        assert_eq!(solver.fixed_value(Lit::pos(v[1])), LBool::True);
        assert_eq!(solver.fixed_value(Lit::pos(v[2])), LBool::False);
        assert_eq!(solver.solve(), SolverResult::Sat);
        assert!(solver.model_value(Lit::neg(v[2])).is_true());
    }

    #[test]
    fn test_contradiction() {
        let mut solver = Solver::new();
        let v = solver.new_var();
        assert!(solver.add_clause([Lit::pos(v)]));
        assert!(!solver.add_clause([Lit::neg(v)]));
        assert_eq!(solver.solve(), SolverResult::Unsat);
        assert!(!solver.is_ok());
    }

    #[test]
    fn test_tautology_ignored() {
        let mut solver = Solver::new();
        let v = solver.new_var();
        assert!(solver.add_clause([Lit::pos(v), Lit::neg(v)]));
        assert_eq!(solver.num_clauses(), 0);
    }

    #[test]
    fn test_pigeonhole_3_into_2_is_unsat() {
        let mut solver = Solver::new();
        // p[i][j]: pigeon i in hole j
        let p: Vec<Vec<Var>> = (0..3).map(|_| lits(&mut solver, 2)).collect();
        for row in &p {
            solver.add_clause(row.iter().map(|&v| Lit::pos(v)));
        }
        for j in 0..2 {
            for a in 0..3 {
                for b in (a + 1)..3 {
                    solver.add_clause([Lit::neg(p[a][j]), Lit::neg(p[b][j])]);
                }
            }
        }
        assert_eq!(solver.solve(), SolverResult::Unsat);
        assert!(solver.stats().conflicts > 0);
    }

    #[test]
    fn test_assumptions_and_conflict() {
        let mut solver = Solver::new();
        let v = lits(&mut solver, 3);
        // a -> b, b -> c
        solver.add_clause([Lit::neg(v[0]), Lit::pos(v[1])]);
        solver.add_clause([Lit::neg(v[1]), Lit::pos(v[2])]);

        let result = solver.solve_with_assumptions(&[Lit::pos(v[0]), Lit::neg(v[2])]);
        assert_eq!(result, SolverResult::Unsat);
        let conflict = solver.conflict().to_vec();
        assert!(!conflict.is_empty());
        for lit in &conflict {
            assert!([Lit::neg(v[0]), Lit::pos(v[2])].contains(lit));
        }

        // Still satisfiable without the assumptions
        assert!(solver.is_ok());
        assert_eq!(solver.solve(), SolverResult::Sat);
    }

    #[test]
    fn test_conflict_budget_gives_unknown() {
        let mut solver = Solver::new();
        // Pigeonhole 6 into 5 needs many conflicts
        let n = 6;
        let p: Vec<Vec<Var>> = (0..n).map(|_| lits(&mut solver, n - 1)).collect();
        for row in &p {
            solver.add_clause(row.iter().map(|&v| Lit::pos(v)));
        }
        for j in 0..(n - 1) {
            for a in 0..n {
                for b in (a + 1)..n {
                    solver.add_clause([Lit::neg(p[a][j]), Lit::neg(p[b][j])]);
                }
            }
        }
        solver.set_conflict_budget(Some(1));
        assert_eq!(solver.solve(), SolverResult::Unknown);
        solver.budget_off();
        assert_eq!(solver.solve(), SolverResult::Unsat);
    }

    #[test]
    fn test_polarity_is_respected() {
        let mut solver = Solver::new();
        let v = solver.new_var();
        solver.set_polarity(v, true);
        assert_eq!(solver.solve(), SolverResult::Sat);
        assert!(solver.model_value(Lit::pos(v)).is_true());

        solver.set_polarity(v, false);
        assert_eq!(solver.solve(), SolverResult::Sat);
        assert!(solver.model_value(Lit::pos(v)).is_false());
    }

    #[test]
    fn test_decision_priority_picks_first_branch() {
        let mut solver = Solver::new();
        let v = lits(&mut solver, 3);
        // Exactly one of the three is true; polarity true on all of them
        // makes the first decision the one that holds
        solver.add_clause(v.iter().map(|&x| Lit::pos(x)));
        for a in 0..3 {
            for b in (a + 1)..3 {
                solver.add_clause([Lit::neg(v[a]), Lit::neg(v[b])]);
            }
        }
        for &x in &v {
            solver.set_polarity(x, true);
        }
        solver.set_decision_priority(v[2], 5);
        assert_eq!(solver.decision_priority(v[2]), 5);
        assert_eq!(solver.decision_priority(v[0]), 0);

        assert_eq!(solver.solve(), SolverResult::Sat);
        assert!(solver.model_value(Lit::pos(v[2])).is_true());

        solver.set_decision_priority(v[1], 9);
        assert_eq!(solver.solve(), SolverResult::Sat);
        assert!(solver.model_value(Lit::pos(v[1])).is_true());
    }

    #[test]
    fn test_non_decision_var_left_unassigned() {
        let mut solver = Solver::new();
        let v = solver.new_var();
        solver.set_decision_var(v, false);
        assert_eq!(solver.solve(), SolverResult::Sat);
        assert!(solver.model_value(Lit::pos(v)).is_undef());
    }
}
