//! Decision order: a binary max-heap of variables keyed by decision
//! priority, then VSIDS activity

use crate::literal::Var;

/// Indexed binary heap over variables.
///
/// A variable with a higher priority always pops before one with a lower
/// priority; activity breaks ties. Every priority starts at 0.
#[derive(Debug, Clone, Default)]
pub struct VarOrder {
    heap: Vec<Var>,
    /// Position of each variable in `heap`, `usize::MAX` when absent
    indices: Vec<usize>,
    priority: Vec<i32>,
}

const ABSENT: usize = usize::MAX;

impl VarOrder {
    /// Create an empty heap
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of variables in the heap
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True if the heap is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// True if `var` is in the heap
    #[must_use]
    pub fn contains(&self, var: Var) -> bool {
        self.indices
            .get(var.index())
            .is_some_and(|&pos| pos != ABSENT)
    }

    /// Variable at heap position `pos`
    #[must_use]
    pub fn get(&self, pos: usize) -> Var {
        self.heap[pos]
    }

    /// Decision priority of `var`
    #[must_use]
    pub fn priority(&self, var: Var) -> i32 {
        self.priority.get(var.index()).copied().unwrap_or(0)
    }

    /// Change the decision priority of `var`, repositioning it if present
    pub fn set_priority(&mut self, var: Var, priority: i32, activity: &[f64]) {
        if var.index() >= self.priority.len() {
            self.priority.resize(var.index() + 1, 0);
        }
        self.priority[var.index()] = priority;
        if self.contains(var) {
            let pos = self.indices[var.index()];
            self.percolate_up(pos, activity);
            self.percolate_down(self.indices[var.index()], activity);
        }
    }

    /// True if `a` must be decided before `b`
    fn before(&self, a: Var, b: Var, activity: &[f64]) -> bool {
        (self.priority(a), activity[a.index()]) > (self.priority(b), activity[b.index()])
    }

    /// Insert `var` if absent
    pub fn insert(&mut self, var: Var, activity: &[f64]) {
        if var.index() >= self.indices.len() {
            self.indices.resize(var.index() + 1, ABSENT);
        }
        if self.contains(var) {
            return;
        }
        self.indices[var.index()] = self.heap.len();
        self.heap.push(var);
        self.percolate_up(self.heap.len() - 1, activity);
    }

    /// Restore the heap after `var`'s activity increased
    pub fn increased(&mut self, var: Var, activity: &[f64]) {
        if self.contains(var) {
            self.percolate_up(self.indices[var.index()], activity);
        }
    }

    /// Remove and return the most active variable
    pub fn pop_max(&mut self, activity: &[f64]) -> Option<Var> {
        let top = *self.heap.first()?;
        let last = self.heap.pop()?;
        self.indices[top.index()] = ABSENT;
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.indices[last.index()] = 0;
            self.percolate_down(0, activity);
        }
        Some(top)
    }

    /// Rebuild the heap from scratch
    pub fn rebuild(&mut self, vars: impl IntoIterator<Item = Var>, activity: &[f64]) {
        for &v in &self.heap {
            self.indices[v.index()] = ABSENT;
        }
        self.heap.clear();
        for v in vars {
            self.insert(v, activity);
        }
    }

    fn percolate_up(&mut self, mut pos: usize, activity: &[f64]) {
        let var = self.heap[pos];
        while pos > 0 {
            let parent = (pos - 1) / 2;
            let pv = self.heap[parent];
            if !self.before(var, pv, activity) {
                break;
            }
            self.heap[pos] = pv;
            self.indices[pv.index()] = pos;
            pos = parent;
        }
        self.heap[pos] = var;
        self.indices[var.index()] = pos;
    }

    fn percolate_down(&mut self, mut pos: usize, activity: &[f64]) {
        let var = self.heap[pos];
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.before(self.heap[right], self.heap[left], activity) {
                right
            } else {
                left
            };
            let cv = self.heap[child];
            if !self.before(cv, var, activity) {
                break;
            }
            self.heap[pos] = cv;
            self.indices[cv.index()] = pos;
            pos = child;
        }
        self.heap[pos] = var;
        self.indices[var.index()] = pos;
    }
}
