//! Watching and propagation.
//!
//! Non-unit constraints watch two of their free variables. When a watched
//! variable gets assigned, each watching constraint first tries to repoint
//! the watch to another unassigned variable; only when none is left does it
//! narrow. Boolean literals between `qhead` and the top of the search stack
//! form the propagation queue; assigning one activates its constraint.

use crate::constraint::{ConstraintKind, SignedConstraint};
use crate::constraint::{eq, member, ule};
use crate::solver::Solver;
use crate::trail::{SearchItem, TrailInstr};
use crate::types::{Lit, PVar};
use tracing::trace;

impl Solver {
    pub(crate) fn can_propagate(&self) -> bool {
        self.qhead < self.search.len() && !self.is_conflict()
    }

    /// Drain the propagation queue.
    pub(crate) fn propagate(&mut self) {
        self.trail.push(TrailInstr::Qhead { prev: self.qhead });
        while self.can_propagate() {
            let item = self.search[self.qhead];
            self.qhead += 1;
            match item {
                SearchItem::Assignment { var, .. } => self.propagate_var(var),
                SearchItem::Boolean(lit) => self.propagate_lit(lit),
            }
        }
        #[cfg(debug_assertions)]
        self.check_invariants();
    }

    /// A boolean literal became true: activate its constraint.
    fn propagate_lit(&mut self, lit: Lit) {
        let sc = self.store.lookup_lit(lit);
        trace!(constraint = %self.store.describe(sc), "activate");
        self.add_watches(sc);
        self.narrow_constraint(sc);
    }

    /// Visit every constraint watching `v`.
    fn propagate_var(&mut self, v: PVar) {
        trace!(var = v, "propagate assignment");
        let mut wlist = std::mem::take(&mut self.watch[v as usize]);
        let mut kept = 0;
        let mut i = 0;
        while i < wlist.len() && !self.is_conflict() {
            let c = wlist[i];
            if !self.repoint_watch(c, v) {
                wlist[kept] = c;
                kept += 1;
            }
            i += 1;
        }
        // On a conflict the remaining entries stay watched.
        while i < wlist.len() {
            wlist[kept] = wlist[i];
            kept += 1;
            i += 1;
        }
        wlist.truncate(kept);
        debug_assert!(self.watch[v as usize].is_empty());
        self.watch[v as usize] = wlist;
    }

    /// Try to move the watch of `c` from `v` to another unassigned variable.
    /// When no replacement exists the constraint narrows and stays watched.
    fn repoint_watch(&mut self, c: SignedConstraint, v: PVar) -> bool {
        let vars = self.store.get(c.id).vars.clone();
        if vars.len() >= 2 {
            let slot = usize::from(vars[0] != v);
            debug_assert_eq!(vars[slot], v);
            for k in (2..vars.len()).rev() {
                if !self.is_assigned(vars[k]) {
                    self.store.get_mut(c.id).vars.swap(slot, k);
                    self.watch[vars[k] as usize].push(c);
                    return true;
                }
            }
        }
        self.narrow_constraint(c);
        false
    }

    /// Insert `c` on the watch lists of its first `min(2, #vars)` variables.
    pub(crate) fn add_watches(&mut self, c: SignedConstraint) {
        let data = self.store.get(c.id);
        let first = data.vars.first().copied();
        let second = data.vars.get(1).copied();
        if let Some(v) = first {
            self.watch[v as usize].push(c);
        }
        if let Some(v) = second {
            self.watch[v as usize].push(c);
        }
    }

    /// Remove `c` from the watch lists of its watched variables.
    pub(crate) fn deactivate(&mut self, c: SignedConstraint) {
        let data = self.store.get(c.id);
        let first = data.vars.first().copied();
        let second = data.vars.get(1).copied();
        for v in [first, second].into_iter().flatten() {
            let wlist = &mut self.watch[v as usize];
            if let Some(pos) = wlist.iter().position(|w| *w == c) {
                wlist.swap_remove(pos);
            }
        }
    }

    /// Narrow a constraint: ground evaluation or unary viable refinement,
    /// dispatched on the constraint kind.
    pub(crate) fn narrow_constraint(&mut self, c: SignedConstraint) {
        let kind = self.store.get(c.id).kind.clone();
        match kind {
            ConstraintKind::Eq(p) => eq::narrow(self, c, &p),
            ConstraintKind::Ule(p, q) => ule::narrow(self, c, &p, &q),
            ConstraintKind::Member(v, pred) => member::narrow(self, c, v, pred),
        }
    }

    /// Re-run narrowing for the constraints watching `v` after its viable
    /// set changed during decision reversion.
    pub(crate) fn narrow_var(&mut self, v: PVar) {
        let mut i = 0;
        while i < self.watch[v as usize].len() && !self.is_conflict() {
            let c = self.watch[v as usize][i];
            self.narrow_constraint(c);
            i += 1;
        }
    }
}
