//! The solver object: state, embedding API, and the top-level search loop.
//!
//! Search alternates boolean/integer propagation with decisions over a single
//! mixed trail; conflicts are handed to the resolution driver in `resolve`.
//! One iteration of [`Solver::check_sat`] does exactly one of: report unsat at
//! the base level, resolve a conflict, drain the propagation queue, decide a
//! variable, or report sat.

use crate::activity::VarQueue;
use crate::boolean::BoolState;
use crate::clause::{Clause, ClauseId};
use crate::conflict::ConflictCore;
use crate::constraint::{ConstraintKind, ConstraintStore, SignedConstraint};
use crate::dep::{Dep, DepManager};
use crate::justification::Justification;
use crate::resource::{LimitStatus, ResourceLimits, ResourceManager};
use crate::stats::Statistics;
use crate::trail::{SearchItem, TrailInstr};
use crate::types::{LBool, Lit, PVar};
use ringsat_math::poly::Var;
use ringsat_math::{Fdd, FindResult, NodeId, Poly, MAX_WIDTH};
use std::fmt;
use tracing::{debug, trace};

/// Result of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatResult {
    /// A satisfying assignment was found.
    Sat,
    /// The assertions are unsatisfiable relative to the current base level.
    Unsat,
    /// The search stopped early; the solver can be resumed.
    Unknown(UnknownReason),
}

/// Why a check returned [`SatResult::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownReason {
    /// The iteration cap was reached.
    Iterations,
    /// The decision cap was reached.
    Decisions,
    /// The conflict cap was reached.
    Conflicts,
    /// The embedder cancelled the search.
    Cancelled,
}

/// Conflict-driven solver for polynomial constraints over ℤ/2^w.
pub struct Solver {
    // Providers, one decision-diagram domain per bit-width.
    pub(crate) fdds: Vec<Option<Fdd>>,
    pub(crate) dm: DepManager,
    pub(crate) store: ConstraintStore,
    pub(crate) bools: BoolState,

    // Per integer variable.
    pub(crate) value: Vec<u64>,
    pub(crate) justification: Vec<Justification>,
    pub(crate) viable: Vec<NodeId>,
    pub(crate) cjust: Vec<Vec<SignedConstraint>>,
    pub(crate) watch: Vec<Vec<SignedConstraint>>,
    pub(crate) vars: Vec<Poly>,
    pub(crate) width: Vec<u32>,
    mark: Vec<u32>,
    mark_clock: u32,
    pub(crate) queue: VarQueue,

    // Search state.
    pub(crate) search: Vec<SearchItem>,
    pub(crate) qhead: usize,
    pub(crate) level: u32,
    pub(crate) trail: Vec<TrailInstr>,
    base_levels: Vec<u32>,

    // Constraint bookkeeping, kept sorted by storage level.
    pub(crate) original: Vec<SignedConstraint>,
    pub(crate) redundant: Vec<SignedConstraint>,
    pub(crate) redundant_clauses: Vec<ClauseId>,

    pub(crate) conflict: ConflictCore,
    pub(crate) stats: Statistics,
    pub(crate) resources: ResourceManager,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create a solver without resource limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(ResourceLimits::default())
    }

    /// Create a solver with resource limits.
    #[must_use]
    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self {
            fdds: Vec::new(),
            dm: DepManager::new(),
            store: ConstraintStore::new(),
            bools: BoolState::new(),
            value: Vec::new(),
            justification: Vec::new(),
            viable: Vec::new(),
            cjust: Vec::new(),
            watch: Vec::new(),
            vars: Vec::new(),
            width: Vec::new(),
            mark: Vec::new(),
            mark_clock: 1,
            queue: VarQueue::new(),
            search: Vec::new(),
            qhead: 0,
            level: 0,
            trail: Vec::new(),
            base_levels: Vec::new(),
            original: Vec::new(),
            redundant: Vec::new(),
            redundant_clauses: Vec::new(),
            conflict: ConflictCore::new(),
            stats: Statistics::default(),
            resources: ResourceManager::new(limits),
        }
    }

    /// Access the resource manager (cancellation flag, limit updates).
    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    /// Fresh integer variable of the given bit-width.
    ///
    /// # Panics
    ///
    /// Panics when `width` is outside `1..=MAX_WIDTH`.
    pub fn add_var(&mut self, width: u32) -> PVar {
        assert!(
            width >= 1 && width <= MAX_WIDTH,
            "variable width {width} outside 1..={MAX_WIDTH}"
        );
        let v = self.value.len() as PVar;
        self.ensure_fdd(width);
        self.value.push(0);
        self.justification.push(Justification::Unassigned);
        self.viable.push(NodeId::TRUE);
        self.cjust.push(Vec::new());
        self.watch.push(Vec::new());
        self.vars.push(Poly::var(width, v));
        self.width.push(width);
        self.mark.push(0);
        self.queue.mk_var(v);
        self.trail.push(TrailInstr::AddVar);
        trace!(var = v, width, "new variable");
        v
    }

    /// The polynomial term for a variable.
    #[must_use]
    pub fn var(&self, v: PVar) -> Poly {
        self.vars[v as usize].clone()
    }

    /// Bit-width of a variable.
    #[must_use]
    pub fn var_width(&self, v: PVar) -> u32 {
        self.width[v as usize]
    }

    /// Current value of a variable, if assigned.
    #[must_use]
    pub fn value_of(&self, v: PVar) -> Option<u64> {
        if self.justification[v as usize].is_unassigned() {
            None
        } else {
            Some(self.value[v as usize])
        }
    }

    /// Assert `p = 0`.
    pub fn add_eq(&mut self, p: Poly, dep: impl Into<Option<u32>>) {
        let (d, tag) = self.mk_dep(dep.into());
        let sc = self
            .store
            .eq(&mut self.bools, &mut self.dm, self.level, p, d);
        self.new_constraint(sc, d, tag);
    }

    /// Assert `p != 0`.
    pub fn add_diseq(&mut self, p: Poly, dep: impl Into<Option<u32>>) {
        let (d, tag) = self.mk_dep(dep.into());
        let sc = self
            .store
            .eq(&mut self.bools, &mut self.dm, self.level, p, d);
        self.new_constraint(!sc, d, tag);
    }

    /// Assert `p <=u q`.
    pub fn add_ule(&mut self, p: Poly, q: Poly, dep: impl Into<Option<u32>>) {
        let (d, tag) = self.mk_dep(dep.into());
        let sc = self
            .store
            .ule(&mut self.bools, &mut self.dm, self.level, p, q, d);
        self.new_constraint(sc, d, tag);
    }

    /// Assert `p <u q`.
    pub fn add_ult(&mut self, p: Poly, q: Poly, dep: impl Into<Option<u32>>) {
        let (d, tag) = self.mk_dep(dep.into());
        let sc = self
            .store
            .ult(&mut self.bools, &mut self.dm, self.level, p, q, d);
        self.new_constraint(sc, d, tag);
    }

    /// Assert `p <=s q` (two's-complement signed).
    pub fn add_sle(&mut self, p: Poly, q: Poly, dep: impl Into<Option<u32>>) {
        let (d, tag) = self.mk_dep(dep.into());
        let sc = self
            .store
            .sle(&mut self.bools, &mut self.dm, self.level, p, q, d);
        self.new_constraint(sc, d, tag);
    }

    /// Assert `p <s q` (two's-complement signed).
    pub fn add_slt(&mut self, p: Poly, q: Poly, dep: impl Into<Option<u32>>) {
        let (d, tag) = self.mk_dep(dep.into());
        let sc = self
            .store
            .slt(&mut self.bools, &mut self.dm, self.level, p, q, d);
        self.new_constraint(sc, d, tag);
    }

    /// Re-assert a previously tagged constraint with the given polarity.
    ///
    /// Unknown tags are logged and ignored.
    pub fn assign_external(&mut self, tag: u32, is_true: bool) {
        assert!(self.at_base_level(), "assertions only at the base level");
        let Some(sc) = self.store.lookup_external(tag) else {
            debug!(tag, "no constraint registered for dependency tag");
            return;
        };
        let sc = if is_true { sc } else { !sc };
        let lit = self.store.blit(sc);
        if self.bools.value_lit(lit) == LBool::True || self.is_conflict() {
            return;
        }
        let cid = self
            .store
            .get(sc.id)
            .unit_clause
            .expect("external constraint has a unit clause");
        if self.bools.value_lit(lit) == LBool::False {
            self.set_conflict_clause(cid);
            return;
        }
        self.propagate_bool(lit, cid);
    }

    /// Open a user scope.
    pub fn push(&mut self) {
        debug!("push user scope");
        self.push_level();
        self.base_levels.push(self.level);
    }

    /// Pop `n` user scopes.
    ///
    /// # Panics
    ///
    /// Panics when more scopes are popped than were pushed.
    pub fn pop(&mut self, n: u32) {
        assert!(
            (n as usize) <= self.base_levels.len(),
            "popping {n} user scopes but only {} pushed",
            self.base_levels.len()
        );
        let keep = self.base_levels.len() - n as usize;
        let base = self.base_levels[keep];
        self.base_levels.truncate(keep);
        debug!(n, base, "pop user scopes");
        self.pop_levels(self.level - base + 1);
        self.conflict.reset();
    }

    /// Check satisfiability of the asserted constraints.
    pub fn check_sat(&mut self) -> SatResult {
        loop {
            match self.resources.check(&self.stats) {
                LimitStatus::Ok => {}
                status => {
                    debug!(?status, "resource limit reached");
                    return SatResult::Unknown(unknown_reason(status));
                }
            }
            self.stats.iterations += 1;
            trace!(
                iteration = self.stats.iterations,
                level = self.level,
                "search loop"
            );
            if self.is_conflict() && self.at_base_level() {
                debug!("unsat");
                return SatResult::Unsat;
            } else if self.is_conflict() {
                self.resolve_conflict();
            } else if self.can_propagate() {
                self.propagate();
            } else if self.can_decide() {
                self.decide_next();
            } else {
                debug_assert!(self.verify_sat());
                debug!("sat");
                return SatResult::Sat;
            }
        }
    }

    /// The unsat core as external dependency tags, after an unsat answer.
    #[must_use]
    pub fn unsat_core(&self) -> Vec<u32> {
        let mut tags = self.dm.linearize(self.conflict.extra_dep);
        for sc in &self.conflict.constraints {
            if self.store.is_live(sc.id) {
                tags.extend(self.dm.linearize(self.store.get(sc.id).dep));
            }
        }
        tags.sort_unstable();
        tags.dedup();
        tags
    }

    /// A snapshot of the search statistics.
    #[must_use]
    pub fn collect_statistics(&self) -> Statistics {
        self.stats.clone()
    }

    /// Evaluate a polynomial under the current partial assignment.
    #[must_use]
    pub fn try_eval(&self, p: &Poly) -> Option<u64> {
        p.subst_val(&self.assignment_vec()).as_val()
    }

    // ------------------------------------------------------------------
    // Internals shared across the submodules.
    // ------------------------------------------------------------------

    pub(crate) fn num_vars(&self) -> usize {
        self.value.len()
    }

    pub(crate) fn is_assigned(&self, v: PVar) -> bool {
        !self.justification[v as usize].is_unassigned()
    }

    pub(crate) fn is_conflict(&self) -> bool {
        self.conflict.is_active()
    }

    pub(crate) fn at_base_level(&self) -> bool {
        self.level == self.base_level()
    }

    pub(crate) fn base_level(&self) -> u32 {
        self.base_levels.last().copied().unwrap_or(0)
    }

    pub(crate) fn assignment_vec(&self) -> Vec<(Var, u64)> {
        self.search
            .iter()
            .filter_map(|item| match *item {
                SearchItem::Assignment { var, val } => Some((var, val)),
                SearchItem::Boolean(_) => None,
            })
            .collect()
    }

    /// Signed truth value of a constraint under the current assignment, if
    /// all of its variables are assigned.
    pub(crate) fn eval_signed(&self, sc: SignedConstraint) -> Option<bool> {
        let data = self.store.get(sc.id);
        let truth = match &data.kind {
            ConstraintKind::Eq(p) => self.try_eval(p).map(|v| v == 0),
            ConstraintKind::Ule(p, q) => match (self.try_eval(p), self.try_eval(q)) {
                (Some(a), Some(b)) => Some(a <= b),
                _ => None,
            },
            ConstraintKind::Member(v, pred) => {
                if self.is_assigned(*v) {
                    Some(
                        self.fdd_ref(self.width[*v as usize])
                            .contains(*pred, self.value[*v as usize]),
                    )
                } else {
                    None
                }
            }
        };
        truth.map(|t| t == sc.positive)
    }

    pub(crate) fn is_currently_false(&self, sc: SignedConstraint) -> bool {
        self.eval_signed(sc) == Some(false)
    }

    pub(crate) fn is_currently_true(&self, sc: SignedConstraint) -> bool {
        self.eval_signed(sc) == Some(true)
    }

    fn mk_dep(&mut self, tag: Option<u32>) -> (Dep, Option<u32>) {
        match tag {
            Some(t) => (self.dm.leaf(t), Some(t)),
            None => (Dep::NULL, None),
        }
    }

    fn new_constraint(&mut self, sc: SignedConstraint, d: Dep, tag: Option<u32>) {
        assert!(self.at_base_level(), "assertions only at the base level");
        debug!(constraint = %self.store.describe(sc), "new constraint");
        let lit = self.store.blit(sc);
        let cid = self.store.store_clause(Clause::unit(lit, self.level, d));
        self.store.get_mut(sc.id).unit_clause = Some(cid);
        if let Some(t) = tag {
            self.store.register_external(t, sc);
        }
        match self.bools.value_lit(lit) {
            LBool::True => return, // duplicate assertion
            LBool::False => {
                // Contradicts an earlier assertion of the opposite sign.
                self.set_conflict_clause(cid);
                return;
            }
            LBool::Undef => {}
        }
        Self::insert_level_sorted(&self.store, &mut self.original, sc);
        if !self.is_conflict() {
            self.propagate_bool(lit, cid);
        }
    }

    pub(crate) fn insert_level_sorted(
        store: &ConstraintStore,
        list: &mut Vec<SignedConstraint>,
        sc: SignedConstraint,
    ) {
        list.push(sc);
        let mut i = list.len() - 1;
        while i > 0 && store.get(list[i - 1].id).level > store.get(list[i].id).level {
            list.swap(i - 1, i);
            i -= 1;
        }
    }

    pub(crate) fn ensure_fdd(&mut self, width: u32) {
        if self.fdds.len() <= width as usize {
            self.fdds.resize_with(width as usize + 1, || None);
        }
        if self.fdds[width as usize].is_none() {
            let fdd = Fdd::new(width).expect("width validated by add_var");
            self.fdds[width as usize] = Some(fdd);
        }
    }

    pub(crate) fn fdd_mut(&mut self, width: u32) -> &mut Fdd {
        self.fdds[width as usize]
            .as_mut()
            .expect("domain created when the first variable of this width was added")
    }

    pub(crate) fn fdd_ref(&self, width: u32) -> &Fdd {
        self.fdds[width as usize]
            .as_ref()
            .expect("domain created when the first variable of this width was added")
    }

    // ------------------------------------------------------------------
    // Assignment and decisions.
    // ------------------------------------------------------------------

    pub(crate) fn can_decide(&self) -> bool {
        !self.queue.is_empty()
    }

    pub(crate) fn decide_next(&mut self) {
        let v = self.queue.next_var();
        self.decide_var(v);
    }

    pub(crate) fn decide_var(&mut self, v: PVar) {
        match self.find_viable(v) {
            FindResult::Empty => {
                // Empty viable sets are normally discovered during narrowing;
                // reaching this from a decision still raises the conflict.
                self.queue.unassign_var(v);
                self.set_conflict_var(v);
            }
            FindResult::Singleton(val) => {
                self.assign_core(v, val, Justification::Propagation { level: self.level });
            }
            FindResult::Multiple(val) => {
                self.push_level();
                self.assign_core(v, val, Justification::Decision { level: self.level });
            }
        }
    }

    pub(crate) fn find_viable(&self, v: PVar) -> FindResult {
        self.fdd_ref(self.width[v as usize])
            .find(self.viable[v as usize], self.value[v as usize])
    }

    pub(crate) fn assign_core(&mut self, v: PVar, val: u64, j: Justification) {
        if j.is_decision() {
            self.stats.decisions += 1;
        } else {
            self.stats.propagations += 1;
        }
        debug!(var = v, val, ?j, "assign");
        debug_assert!(self.is_viable(v, val));
        debug_assert!(self.justification[v as usize].is_unassigned());
        self.value[v as usize] = val;
        self.justification[v as usize] = j;
        self.search.push(SearchItem::Assignment { var: v, val });
        self.trail.push(TrailInstr::AssignInt);
    }

    /// Assign `v := val` as a propagation justified by `c`, or raise a
    /// conflict when the value is not viable.
    pub(crate) fn propagate_value(&mut self, v: PVar, val: u64, c: SignedConstraint) {
        if self.is_viable(v, val) {
            self.queue.del_var(v);
            self.assign_core(v, val, Justification::Propagation { level: self.level });
        } else {
            self.set_conflict(c);
        }
    }

    // ------------------------------------------------------------------
    // Boolean assignment.
    // ------------------------------------------------------------------

    pub(crate) fn propagate_bool(&mut self, lit: Lit, reason: ClauseId) {
        trace!(%lit, "propagate boolean literal");
        self.assign_bool(lit, Some(reason), None);
    }

    pub(crate) fn decide_bool_lit(&mut self, lit: Lit, lemma: ClauseId) {
        self.push_level();
        debug!(%lit, level = self.level, "decide boolean literal");
        self.assign_bool(lit, None, Some(lemma));
    }

    fn assign_bool(&mut self, lit: Lit, reason: Option<ClauseId>, lemma: Option<ClauseId>) {
        if self.bools.assign(lit, self.level, reason, lemma) {
            self.search.push(SearchItem::Boolean(lit));
            self.trail.push(TrailInstr::AssignBool);
        }
    }

    // ------------------------------------------------------------------
    // Conflicts.
    // ------------------------------------------------------------------

    pub(crate) fn set_conflict(&mut self, c: SignedConstraint) {
        if self.is_conflict() {
            return;
        }
        debug!(constraint = %self.store.describe(c), "conflict");
        self.conflict.set_constraint(c);
    }

    pub(crate) fn set_conflict_var(&mut self, v: PVar) {
        if self.is_conflict() {
            return;
        }
        debug!(var = v, "conflict: empty viable set");
        self.conflict.set_var(v, &self.cjust[v as usize]);
    }

    pub(crate) fn set_conflict_clause(&mut self, cid: ClauseId) {
        if self.is_conflict() {
            return;
        }
        debug!(clause = cid, "conflict: falsified clause");
        let clause = self.store.clause(cid);
        let negated: Vec<SignedConstraint> = clause
            .literals()
            .iter()
            .map(|&l| !self.store.lookup_lit(l))
            .collect();
        let all_assigned_false = clause
            .literals()
            .iter()
            .all(|&l| self.bools.value_lit(l) == LBool::False);
        let dep = clause.dep();
        self.conflict.set_clause(negated, dep, !all_assigned_false);
    }

    // ------------------------------------------------------------------
    // Variable marks (epoch counter, reset is O(1)).
    // ------------------------------------------------------------------

    pub(crate) fn set_mark(&mut self, v: PVar) {
        self.mark[v as usize] = self.mark_clock;
    }

    pub(crate) fn is_marked(&self, v: PVar) -> bool {
        self.mark[v as usize] == self.mark_clock
    }

    pub(crate) fn reset_marks(&mut self) {
        self.mark_clock = self.mark_clock.wrapping_add(1);
        if self.mark_clock == 0 {
            self.mark.fill(0);
            self.mark_clock = 1;
        }
    }

    pub(crate) fn pop_mark(&mut self) {
        self.mark.pop();
    }

    // ------------------------------------------------------------------
    // Debug-mode checks.
    // ------------------------------------------------------------------

    /// Check the structural invariants; panics on violation.
    pub fn check_invariants(&self) {
        // Watch lists: no duplicates, and each active non-ground constraint
        // is watched by min(2, #vars) variables.
        for (v, wlist) in self.watch.iter().enumerate() {
            for (i, c) in wlist.iter().enumerate() {
                assert!(
                    !wlist[i + 1..].contains(c),
                    "duplicate watch for constraint {} on v{v}",
                    c.id
                );
            }
        }
        // Watch cardinality is only settled once the queue is drained:
        // assigned-but-unactivated constraints are still pending there.
        if self.qhead == self.search.len() {
            for &sc in self.original.iter().chain(&self.redundant) {
                let data = self.store.get(sc.id);
                if self.bools.value(data.bvar) == LBool::Undef {
                    continue;
                }
                let expected = data.vars.len().min(2);
                let watched = self
                    .watch
                    .iter()
                    .map(|wl| wl.iter().filter(|w| w.id == sc.id).count())
                    .sum::<usize>();
                assert_eq!(
                    watched, expected,
                    "constraint {} has {watched} watches, expected {expected}",
                    sc.id
                );
            }
        }
        // Assigned values stay viable (a refinement that evicted one must
        // have raised a conflict instead).
        if !self.is_conflict() {
            for v in 0..self.num_vars() as PVar {
                if self.is_assigned(v) {
                    assert!(
                        self.is_viable(v, self.value[v as usize]),
                        "assigned value of v{v} left its viable set"
                    );
                }
            }
        }
        // Every bookkeeping entry points at a live constraint.
        for &sc in self.original.iter().chain(&self.redundant) {
            assert!(self.store.is_live(sc.id), "stale bookkeeping entry");
        }
    }

    /// Do all original constraints hold in the current full model?
    pub(crate) fn verify_sat(&self) -> bool {
        self.original.iter().all(|&sc| {
            let ok = self.is_currently_true(sc);
            if !ok {
                debug!(constraint = %self.store.describe(sc), "model check failed");
            }
            ok
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_constraint_restricts_values() {
        let mut s = Solver::new();
        let v = s.add_var(3);
        // Restrict v to {2, 3} through a membership constraint.
        let pred = {
            let f = s.fdd_mut(3);
            let le3 = f.affine_ule(1, 0, 0, 3);
            let ge2 = f.affine_ule(0, 2, 1, 0);
            f.and(le3, ge2)
        };
        let level = s.level;
        let sc = s
            .store
            .member(&mut s.bools, &mut s.dm, level, v, pred, Dep::NULL);
        let lit = s.store.blit(sc);
        let cid = s.store.store_clause(Clause::unit(lit, level, Dep::NULL));
        s.store.get_mut(sc.id).unit_clause = Some(cid);
        Solver::insert_level_sorted(&s.store, &mut s.original, sc);
        s.propagate_bool(lit, cid);
        assert_eq!(s.check_sat(), SatResult::Sat);
        let val = s.value_of(v).unwrap();
        assert!(val == 2 || val == 3, "value {val} escaped the membership set");
        s.check_invariants();
    }

    #[test]
    fn test_negated_member_constraint() {
        let mut s = Solver::new();
        let v = s.add_var(2);
        let level = s.level;
        let pred = s.fdd_mut(2).ne_val(1);
        let sc = s
            .store
            .member(&mut s.bools, &mut s.dm, level, v, pred, Dep::NULL);
        // assert the negation: v is NOT in {0, 2, 3}, i.e. v = 1
        let lit = s.store.blit(!sc);
        let cid = s.store.store_clause(Clause::unit(lit, level, Dep::NULL));
        s.store.get_mut(sc.id).unit_clause = Some(cid);
        Solver::insert_level_sorted(&s.store, &mut s.original, !sc);
        s.propagate_bool(lit, cid);
        assert_eq!(s.check_sat(), SatResult::Sat);
        assert_eq!(s.value_of(v), Some(1));
    }

    #[test]
    fn test_full_pop_restores_initial_state() {
        let mut s = Solver::new();
        s.push();
        let a = s.add_var(2);
        let b = s.add_var(2);
        s.add_eq(s.var(a) + s.var(b) + 1, None);
        assert_eq!(s.check_sat(), SatResult::Sat);
        s.pop(1);
        assert_eq!(s.num_vars(), 0);
        assert_eq!(s.level, 0);
        assert!(s.search.is_empty());
        assert!(s.trail.is_empty());
        assert!(s.original.is_empty());
        assert!(!s.is_conflict());
    }

    #[test]
    fn test_assign_external_unknown_tag_ignored() {
        let mut s = Solver::new();
        let a = s.add_var(2);
        s.add_eq(s.var(a) + 1, 5u32);
        s.assign_external(99, true); // unknown tag: logged and dropped
        s.assign_external(5, true); // already asserted: no-op
        assert_eq!(s.check_sat(), SatResult::Sat);
        assert_eq!(s.value_of(a), Some(3));
    }

    #[test]
    #[should_panic(expected = "variable width")]
    fn test_add_var_rejects_zero_width() {
        let mut s = Solver::new();
        let _ = s.add_var(0);
    }
}

fn unknown_reason(status: LimitStatus) -> UnknownReason {
    match status {
        LimitStatus::Iterations => UnknownReason::Iterations,
        LimitStatus::Decisions => UnknownReason::Decisions,
        LimitStatus::Conflicts => UnknownReason::Conflicts,
        LimitStatus::Cancelled => UnknownReason::Cancelled,
        LimitStatus::Ok => unreachable!("limit status is a failure"),
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "assignment:")?;
        for item in &self.search {
            match *item {
                SearchItem::Assignment { var, val } => {
                    let j = self.justification[var as usize];
                    writeln!(f, "  v{var} := {val} @{}", j.level())?;
                }
                SearchItem::Boolean(lit) => {
                    let sc = self.store.lookup_lit(lit);
                    writeln!(f, "  {lit}: {}", self.store.describe(sc))?;
                }
            }
        }
        writeln!(f, "original:")?;
        for &sc in &self.original {
            writeln!(f, "  {}", self.store.describe(sc))?;
        }
        if !self.redundant.is_empty() {
            writeln!(f, "redundant:")?;
            for &sc in &self.redundant {
                writeln!(f, "  {}", self.store.describe(sc))?;
            }
        }
        Ok(())
    }
}
