//! Clause storage

use crate::literal::Lit;
use smallvec::SmallVec;

/// Identifier of a clause in the [`ClauseDatabase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClauseId(u32);

impl ClauseId {
    /// Index into the database
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A clause with at least two literals; the first two are watched.
#[derive(Debug, Clone)]
pub struct Clause {
    /// Literals; positions 0 and 1 are watched.
    pub lits: SmallVec<[Lit; 8]>,
    /// Learnt by conflict analysis (deletable)
    pub learnt: bool,
    /// Bumped when the clause takes part in conflict analysis.
    pub activity: f64,
    /// Marked for removal; watchers are swept lazily.
    pub deleted: bool,
}

impl Clause {
    /// Number of literals
    #[must_use]
    pub fn len(&self) -> usize {
        self.lits.len()
    }

    /// True for the empty clause
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }
}

/// Slab of clauses with slot reuse.
#[derive(Debug, Clone, Default)]
pub struct ClauseDatabase {
    clauses: Vec<Clause>,
    free: Vec<ClauseId>,
    live: usize,
}

impl ClauseDatabase {
    /// Create an empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a clause and return its id.
    pub fn alloc(&mut self, lits: impl IntoIterator<Item = Lit>, learnt: bool) -> ClauseId {
        let clause = Clause {
            lits: lits.into_iter().collect(),
            learnt,
            activity: 0.0,
            deleted: false,
        };
        self.live += 1;
        if let Some(id) = self.free.pop() {
            self.clauses[id.index()] = clause;
            id
        } else {
            let id = ClauseId(self.clauses.len() as u32);
            self.clauses.push(clause);
            id
        }
    }

    /// Mark a clause deleted. Its slot is reusable only after [`Self::release`].
    pub fn mark_deleted(&mut self, id: ClauseId) {
        let clause = &mut self.clauses[id.index()];
        if !clause.deleted {
            clause.deleted = true;
            self.live -= 1;
        }
    }

    /// Return deleted slots to the free list once no watcher points at them.
    pub fn release(&mut self, ids: impl IntoIterator<Item = ClauseId>) {
        for id in ids {
            let clause = &mut self.clauses[id.index()];
            debug_assert!(clause.deleted);
            clause.lits.clear();
            self.free.push(id);
        }
    }

    /// Borrow a clause
    #[must_use]
    pub fn get(&self, id: ClauseId) -> &Clause {
        &self.clauses[id.index()]
    }

    /// Mutably borrow a clause
    pub fn get_mut(&mut self, id: ClauseId) -> &mut Clause {
        &mut self.clauses[id.index()]
    }

    /// Number of clauses that are not deleted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// True if no live clause is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Var;

    #[test]
    fn test_alloc_and_reuse() {
        let mut db = ClauseDatabase::new();
        let a = Lit::pos(Var::new(0));
        let b = Lit::neg(Var::new(1));

        let c0 = db.alloc([a, b], false);
        let c1 = db.alloc([!a, b], true);
        assert_eq!(db.len(), 2);
        assert!(db.get(c1).learnt);

        db.mark_deleted(c1);
        db.mark_deleted(c1);
        assert_eq!(db.len(), 1);
        db.release([c1]);

        let c2 = db.alloc([a, !b], false);
        assert_eq!(c2, c1);
        assert!(!db.get(c2).deleted);
        assert_eq!(db.get(c0).lits.as_slice(), &[a, b]);
    }
}
