//! The conflict core: what is currently known to be jointly infeasible.
//!
//! A conflict is a set of signed constraints that cannot all hold together
//! with the current assignment, plus an optional conflict variable when the
//! conflict is an emptied viable set. `needs_model` records whether the
//! infeasibility depends on the assignment (in which case the negation of the
//! core is not a valid lemma on its own); `bailout` records that precise
//! explanation was abandoned and resolution falls back to reverting
//! decisions.

use crate::constraint::SignedConstraint;
use crate::dep::Dep;
use crate::types::PVar;

#[derive(Debug)]
pub(crate) struct ConflictCore {
    active: bool,
    pub(crate) constraints: Vec<SignedConstraint>,
    pub(crate) conflict_var: Option<PVar>,
    pub(crate) needs_model: bool,
    pub(crate) bailout: bool,
    /// Dependencies not attached to any core constraint (reason clauses,
    /// falsified lemmas).
    pub(crate) extra_dep: Dep,
}

impl ConflictCore {
    pub(crate) fn new() -> Self {
        Self {
            active: false,
            constraints: Vec::new(),
            conflict_var: None,
            needs_model: true,
            bailout: false,
            extra_dep: Dep::NULL,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn reset(&mut self) {
        self.active = false;
        self.constraints.clear();
        self.conflict_var = None;
        self.needs_model = true;
        self.bailout = false;
        self.extra_dep = Dep::NULL;
    }

    /// Conflict from a single constraint that is false under the model.
    pub(crate) fn set_constraint(&mut self, c: SignedConstraint) {
        debug_assert!(!self.active);
        self.reset();
        self.active = true;
        self.constraints.push(c);
    }

    /// Conflict from an emptied viable set, justified by `cjust`.
    pub(crate) fn set_var(&mut self, v: PVar, cjust: &[SignedConstraint]) {
        debug_assert!(!self.active);
        self.reset();
        self.active = true;
        self.conflict_var = Some(v);
        for &c in cjust {
            self.insert(c);
        }
    }

    /// Conflict from a falsified clause: the negations of its literals.
    pub(crate) fn set_clause(
        &mut self,
        negated: Vec<SignedConstraint>,
        dep: Dep,
        needs_model: bool,
    ) {
        debug_assert!(!self.active);
        self.reset();
        self.active = true;
        self.needs_model = needs_model;
        self.extra_dep = dep;
        for c in negated {
            self.insert(c);
        }
    }

    pub(crate) fn insert(&mut self, c: SignedConstraint) {
        if !self.constraints.contains(&c) {
            self.constraints.push(c);
        }
    }

    pub(crate) fn remove(&mut self, c: SignedConstraint) {
        self.constraints.retain(|&x| x != c);
    }

    /// Swap a resolved constraint for its resolvent, keeping the premise.
    pub(crate) fn replace(
        &mut self,
        old: SignedConstraint,
        premise: SignedConstraint,
        new: SignedConstraint,
    ) {
        self.remove(old);
        self.insert(premise);
        self.insert(new);
    }

    pub(crate) fn set_bailout(&mut self) {
        self.bailout = true;
    }
}
