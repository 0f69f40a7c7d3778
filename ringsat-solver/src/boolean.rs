//! Per-boolean-variable assignment state.
//!
//! Boolean variables are allocated by the constraint store (one per
//! constraint) and freed when the constraint is released; slots are recycled
//! through a free list. Marks use a clock so resetting them is O(1).

use crate::clause::ClauseId;
use crate::types::{BVar, LBool, Lit};

/// Assignment state of all boolean variables.
#[derive(Debug, Default)]
pub(crate) struct BoolState {
    value: Vec<LBool>,
    level: Vec<u32>,
    reason: Vec<Option<ClauseId>>,
    lemma: Vec<Option<ClauseId>>,
    mark: Vec<u32>,
    clock: u32,
    free: Vec<BVar>,
}

impl BoolState {
    pub(crate) fn new() -> Self {
        Self {
            clock: 1,
            ..Self::default()
        }
    }

    /// Allocate a boolean variable, reusing a freed slot if possible.
    pub(crate) fn new_var(&mut self) -> BVar {
        if let Some(v) = self.free.pop() {
            return v;
        }
        let v = self.value.len() as BVar;
        self.value.push(LBool::Undef);
        self.level.push(0);
        self.reason.push(None);
        self.lemma.push(None);
        self.mark.push(0);
        v
    }

    /// Return a variable to the free list. It must be unassigned.
    pub(crate) fn del_var(&mut self, v: BVar) {
        debug_assert_eq!(self.value[v as usize], LBool::Undef);
        self.reason[v as usize] = None;
        self.lemma[v as usize] = None;
        self.free.push(v);
    }

    pub(crate) fn value(&self, v: BVar) -> LBool {
        self.value[v as usize]
    }

    pub(crate) fn value_lit(&self, lit: Lit) -> LBool {
        let v = self.value[lit.var() as usize];
        if lit.is_positive() {
            v
        } else {
            v.negate()
        }
    }

    /// Record an assignment making `lit` true.
    ///
    /// Returns false when the literal already holds (nothing recorded);
    /// assigning the opposite value of an assigned variable is a caller bug.
    pub(crate) fn assign(
        &mut self,
        lit: Lit,
        level: u32,
        reason: Option<ClauseId>,
        lemma: Option<ClauseId>,
    ) -> bool {
        let v = lit.var() as usize;
        match self.value_lit(lit) {
            LBool::True => return false,
            LBool::False => unreachable!("conflicting boolean assignment for {lit}"),
            LBool::Undef => {}
        }
        self.value[v] = LBool::from_bool(lit.is_positive());
        self.level[v] = level;
        self.reason[v] = reason;
        self.lemma[v] = lemma;
        true
    }

    pub(crate) fn unassign(&mut self, v: BVar) {
        let v = v as usize;
        self.value[v] = LBool::Undef;
        self.reason[v] = None;
        self.lemma[v] = None;
    }

    pub(crate) fn level(&self, v: BVar) -> u32 {
        self.level[v as usize]
    }

    pub(crate) fn reason(&self, v: BVar) -> Option<ClauseId> {
        self.reason[v as usize]
    }

    pub(crate) fn lemma(&self, v: BVar) -> Option<ClauseId> {
        self.lemma[v as usize]
    }

    /// An assigned variable without a reason clause is a decision.
    pub(crate) fn is_decision(&self, v: BVar) -> bool {
        self.value[v as usize] != LBool::Undef && self.reason[v as usize].is_none()
    }

    pub(crate) fn is_propagation(&self, v: BVar) -> bool {
        self.value[v as usize] != LBool::Undef && self.reason[v as usize].is_some()
    }

    pub(crate) fn set_mark(&mut self, v: BVar) {
        self.mark[v as usize] = self.clock;
    }

    pub(crate) fn is_marked(&self, v: BVar) -> bool {
        self.mark[v as usize] == self.clock
    }

    pub(crate) fn reset_marks(&mut self) {
        self.clock = self.clock.wrapping_add(1);
        if self.clock == 0 {
            self.mark.fill(0);
            self.clock = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_unassign() {
        let mut b = BoolState::new();
        let v = b.new_var();
        let lit = Lit::negative(v);
        assert_eq!(b.value_lit(lit), LBool::Undef);
        assert!(b.assign(lit, 3, None, None));
        assert_eq!(b.value_lit(lit), LBool::True);
        assert_eq!(b.value(v), LBool::False);
        assert_eq!(b.level(v), 3);
        assert!(b.is_decision(v));
        assert!(!b.assign(lit, 3, None, None));
        b.unassign(v);
        assert_eq!(b.value(v), LBool::Undef);
    }

    #[test]
    fn test_slot_reuse() {
        let mut b = BoolState::new();
        let v0 = b.new_var();
        let _v1 = b.new_var();
        b.del_var(v0);
        assert_eq!(b.new_var(), v0);
    }

    #[test]
    fn test_marks() {
        let mut b = BoolState::new();
        let v = b.new_var();
        b.set_mark(v);
        assert!(b.is_marked(v));
        b.reset_marks();
        assert!(!b.is_marked(v));
    }
}
