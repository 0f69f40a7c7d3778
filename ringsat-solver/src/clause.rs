//! Clauses over constraint literals.
//!
//! A clause is a disjunction of boolean literals, each literal standing for a
//! signed constraint. Clauses are owned by the constraint store and live until
//! their storage level is popped. The guess cursor remembers where enumerative
//! backtracking should continue looking for a literal to try next.

use crate::dep::Dep;
use crate::types::{Lit, PVar};
use smallvec::SmallVec;

/// Index of a clause in the constraint store.
pub(crate) type ClauseId = u32;

/// A stored disjunction of constraint literals.
#[derive(Debug, Clone)]
pub(crate) struct Clause {
    literals: SmallVec<[Lit; 4]>,
    level: u32,
    dep: Dep,
    /// Cursor for enumerative guessing over this clause's literals.
    pub(crate) next_guess: u32,
    /// Variable whose viable-set restriction this clause justifies, if any.
    pub(crate) justified_var: Option<PVar>,
}

impl Clause {
    pub(crate) fn new(level: u32, dep: Dep, literals: impl IntoIterator<Item = Lit>) -> Self {
        Self {
            literals: literals.into_iter().collect(),
            level,
            dep,
            next_guess: 0,
            justified_var: None,
        }
    }

    pub(crate) fn unit(lit: Lit, level: u32, dep: Dep) -> Self {
        Self::new(level, dep, [lit])
    }

    pub(crate) fn literals(&self) -> &[Lit] {
        &self.literals
    }

    pub(crate) fn len(&self) -> usize {
        self.literals.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub(crate) fn contains(&self, lit: Lit) -> bool {
        self.literals.contains(&lit)
    }

    /// Append a literal unless it is already present.
    pub(crate) fn push_unique(&mut self, lit: Lit) {
        if !self.contains(lit) {
            self.literals.push(lit);
        }
    }

    pub(crate) fn level(&self) -> u32 {
        self.level
    }

    pub(crate) fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    pub(crate) fn dep(&self) -> Dep {
        self.dep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_unique() {
        let a = Lit::positive(0);
        let b = Lit::negative(1);
        let mut cl = Clause::new(0, Dep::NULL, [a]);
        cl.push_unique(b);
        cl.push_unique(a);
        assert_eq!(cl.len(), 2);
        assert!(cl.contains(a));
        assert!(cl.contains(b));
    }

    #[test]
    fn test_unit() {
        let cl = Clause::unit(Lit::positive(3), 2, Dep::NULL);
        assert_eq!(cl.len(), 1);
        assert_eq!(cl.level(), 2);
    }
}
