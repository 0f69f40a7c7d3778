//! Constraints, signed references to them, and the owning store.
//!
//! A constraint is interned once and referred to by index; the sign lives in
//! [`SignedConstraint`], so negation is a bit flip and never allocates. The
//! store associates every constraint with a boolean variable (the constraint
//! itself is the positive literal), buckets constraints and clauses by storage
//! level, and releases whole levels on backtracking past them.

pub(crate) mod eq;
pub(crate) mod member;
pub(crate) mod ule;

use crate::boolean::BoolState;
use crate::clause::{Clause, ClauseId};
use crate::dep::{Dep, DepManager};
use crate::types::{BVar, Lit, PVar};
use ringsat_math::{modular, NodeId, Poly};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

/// Index of a constraint in the store.
pub(crate) type ConstraintId = u32;

/// The semantic payload of a constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConstraintKind {
    /// `p = 0`.
    Eq(Poly),
    /// `lhs <=u rhs`.
    Ule(Poly, Poly),
    /// Membership of a variable in a fixed predicate over its domain.
    Member(PVar, NodeId),
}

/// Interning key: kind plus canonical operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstraintKey {
    Eq(Poly),
    Ule(Poly, Poly),
    Member(PVar, NodeId),
}

#[derive(Debug)]
pub(crate) struct ConstraintData {
    pub(crate) kind: ConstraintKind,
    /// Free variables; the first two slots are the watched variables.
    pub(crate) vars: SmallVec<[PVar; 4]>,
    pub(crate) bvar: BVar,
    pub(crate) level: u32,
    pub(crate) dep: Dep,
    pub(crate) unit_clause: Option<ClauseId>,
}

impl fmt::Display for ConstraintData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConstraintKind::Eq(p) => write!(f, "{p} = 0"),
            ConstraintKind::Ule(p, q) => write!(f, "{p} <= {q}"),
            ConstraintKind::Member(v, _) => write!(f, "v{v} in <set>"),
        }
    }
}

/// A constraint reference with a polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SignedConstraint {
    pub(crate) id: ConstraintId,
    pub(crate) positive: bool,
}

impl std::ops::Not for SignedConstraint {
    type Output = SignedConstraint;
    fn not(self) -> SignedConstraint {
        SignedConstraint {
            id: self.id,
            positive: !self.positive,
        }
    }
}

/// Owner of all constraints and clauses.
#[derive(Debug, Default)]
pub(crate) struct ConstraintStore {
    constraints: Vec<Option<ConstraintData>>,
    free_ids: Vec<ConstraintId>,
    dedup: FxHashMap<ConstraintKey, ConstraintId>,
    by_level: Vec<Vec<ConstraintId>>,
    bv2c: Vec<Option<ConstraintId>>,
    clauses: Vec<Option<Clause>>,
    free_clause_ids: Vec<ClauseId>,
    clauses_by_level: Vec<Vec<ClauseId>>,
    external: FxHashMap<u32, SignedConstraint>,
}

impl ConstraintStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Intern `p = 0` at the given storage level; returns the positive form.
    pub(crate) fn eq(
        &mut self,
        bools: &mut BoolState,
        dm: &mut DepManager,
        level: u32,
        p: Poly,
        dep: Dep,
    ) -> SignedConstraint {
        let vars: SmallVec<[PVar; 4]> = p.free_vars();
        let key = ConstraintKey::Eq(p.clone());
        let kind = ConstraintKind::Eq(p);
        self.intern(bools, dm, level, key, kind, vars, dep)
    }

    /// Intern `p <=u q`; returns the positive form.
    pub(crate) fn ule(
        &mut self,
        bools: &mut BoolState,
        dm: &mut DepManager,
        level: u32,
        p: Poly,
        q: Poly,
        dep: Dep,
    ) -> SignedConstraint {
        let mut vars: SmallVec<[PVar; 4]> = p.free_vars();
        for v in q.free_vars() {
            if let Err(pos) = vars.binary_search(&v) {
                vars.insert(pos, v);
            }
        }
        let key = ConstraintKey::Ule(p.clone(), q.clone());
        let kind = ConstraintKind::Ule(p, q);
        self.intern(bools, dm, level, key, kind, vars, dep)
    }

    /// `p <u q`, expressed as the negation of `q <= p`.
    pub(crate) fn ult(
        &mut self,
        bools: &mut BoolState,
        dm: &mut DepManager,
        level: u32,
        p: Poly,
        q: Poly,
        dep: Dep,
    ) -> SignedConstraint {
        !self.ule(bools, dm, level, q, p, dep)
    }

    /// Signed `p <=s q`: shift both sides by `2^(w-1)` and compare unsigned.
    pub(crate) fn sle(
        &mut self,
        bools: &mut BoolState,
        dm: &mut DepManager,
        level: u32,
        p: Poly,
        q: Poly,
        dep: Dep,
    ) -> SignedConstraint {
        let shift = modular::half_modulus(p.width());
        self.ule(bools, dm, level, p + shift, q + shift, dep)
    }

    /// Signed `p <s q`, the negation of `q <=s p`.
    pub(crate) fn slt(
        &mut self,
        bools: &mut BoolState,
        dm: &mut DepManager,
        level: u32,
        p: Poly,
        q: Poly,
        dep: Dep,
    ) -> SignedConstraint {
        !self.sle(bools, dm, level, q, p, dep)
    }

    /// Membership of `v` in a fixed predicate.
    pub(crate) fn member(
        &mut self,
        bools: &mut BoolState,
        dm: &mut DepManager,
        level: u32,
        v: PVar,
        pred: NodeId,
        dep: Dep,
    ) -> SignedConstraint {
        let key = ConstraintKey::Member(v, pred);
        let kind = ConstraintKind::Member(v, pred);
        self.intern(bools, dm, level, key, kind, SmallVec::from_slice(&[v]), dep)
    }

    fn intern(
        &mut self,
        bools: &mut BoolState,
        dm: &mut DepManager,
        level: u32,
        key: ConstraintKey,
        kind: ConstraintKind,
        vars: SmallVec<[PVar; 4]>,
        dep: Dep,
    ) -> SignedConstraint {
        if let Some(&id) = self.dedup.get(&key) {
            let moved_from = {
                let data = self.constraints[id as usize]
                    .as_mut()
                    .expect("interned constraint is live");
                data.dep = dm.join(data.dep, dep);
                if level < data.level {
                    // Re-interning at a lower level extends the lifetime.
                    let old = data.level;
                    data.level = level;
                    Some(old)
                } else {
                    None
                }
            };
            if let Some(old) = moved_from {
                self.by_level[old as usize].retain(|&c| c != id);
                self.bucket(level).push(id);
            }
            return SignedConstraint { id, positive: true };
        }
        let bvar = bools.new_var();
        let data = ConstraintData {
            kind,
            vars,
            bvar,
            level,
            dep,
            unit_clause: None,
        };
        let id = match self.free_ids.pop() {
            Some(id) => {
                self.constraints[id as usize] = Some(data);
                id
            }
            None => {
                let id = self.constraints.len() as ConstraintId;
                self.constraints.push(Some(data));
                id
            }
        };
        self.dedup.insert(key, id);
        self.bucket(level).push(id);
        if self.bv2c.len() <= bvar as usize {
            self.bv2c.resize(bvar as usize + 1, None);
        }
        self.bv2c[bvar as usize] = Some(id);
        SignedConstraint { id, positive: true }
    }

    pub(crate) fn get(&self, id: ConstraintId) -> &ConstraintData {
        self.constraints[id as usize]
            .as_ref()
            .expect("constraint was released")
    }

    pub(crate) fn get_mut(&mut self, id: ConstraintId) -> &mut ConstraintData {
        self.constraints[id as usize]
            .as_mut()
            .expect("constraint was released")
    }

    /// The literal asserting this signed constraint.
    pub(crate) fn blit(&self, sc: SignedConstraint) -> Lit {
        let bvar = self.get(sc.id).bvar;
        if sc.positive {
            Lit::positive(bvar)
        } else {
            Lit::negative(bvar)
        }
    }

    /// The signed constraint a literal stands for.
    pub(crate) fn lookup_lit(&self, lit: Lit) -> SignedConstraint {
        let id = self.bv2c[lit.var() as usize].expect("literal of a released constraint");
        SignedConstraint {
            id,
            positive: lit.is_positive(),
        }
    }

    /// Store a clause, bucketed by its storage level.
    pub(crate) fn store_clause(&mut self, clause: Clause) -> ClauseId {
        let level = clause.level();
        let id = match self.free_clause_ids.pop() {
            Some(id) => {
                self.clauses[id as usize] = Some(clause);
                id
            }
            None => {
                let id = self.clauses.len() as ClauseId;
                self.clauses.push(Some(clause));
                id
            }
        };
        if self.clauses_by_level.len() <= level as usize {
            self.clauses_by_level.resize_with(level as usize + 1, Vec::new);
        }
        self.clauses_by_level[level as usize].push(id);
        id
    }

    pub(crate) fn clause(&self, id: ClauseId) -> &Clause {
        self.clauses[id as usize]
            .as_ref()
            .expect("clause was released")
    }

    pub(crate) fn clause_mut(&mut self, id: ClauseId) -> &mut Clause {
        self.clauses[id as usize]
            .as_mut()
            .expect("clause was released")
    }

    /// Record the external tag of an asserted constraint.
    pub(crate) fn register_external(&mut self, tag: u32, sc: SignedConstraint) {
        self.external.insert(tag, sc);
    }

    /// Resolve an external tag back to its constraint.
    pub(crate) fn lookup_external(&self, tag: u32) -> Option<SignedConstraint> {
        self.external.get(&tag).copied()
    }

    /// Drop every constraint and clause stored at `level` or above, freeing
    /// their boolean variables.
    pub(crate) fn release_level(&mut self, level: u32, bools: &mut BoolState) {
        for bucket in self.by_level.iter_mut().skip(level as usize) {
            for id in bucket.drain(..) {
                let data = self.constraints[id as usize]
                    .take()
                    .expect("released constraint is live");
                let key = match data.kind {
                    ConstraintKind::Eq(p) => ConstraintKey::Eq(p),
                    ConstraintKind::Ule(p, q) => ConstraintKey::Ule(p, q),
                    ConstraintKind::Member(v, n) => ConstraintKey::Member(v, n),
                };
                self.dedup.remove(&key);
                self.bv2c[data.bvar as usize] = None;
                bools.del_var(data.bvar);
                self.free_ids.push(id);
            }
        }
        for bucket in self.clauses_by_level.iter_mut().skip(level as usize) {
            for id in bucket.drain(..) {
                self.clauses[id as usize] = None;
                self.free_clause_ids.push(id);
            }
        }
        let constraints = &self.constraints;
        self.external
            .retain(|_, sc| constraints[sc.id as usize].is_some());
    }

    /// Is the constraint still owned by the store?
    pub(crate) fn is_live(&self, id: ConstraintId) -> bool {
        self.constraints[id as usize].is_some()
    }

    /// Human-readable form of a signed constraint, for logging.
    pub(crate) fn describe(&self, sc: SignedConstraint) -> String {
        let data = self.get(sc.id);
        if sc.positive {
            format!("{data}")
        } else {
            format!("not({data})")
        }
    }

    /// Move a constraint to a lower storage level, extending its lifetime.
    pub(crate) fn lower_level(&mut self, id: ConstraintId, level: u32) {
        let old = self.get(id).level;
        if level >= old {
            return;
        }
        self.get_mut(id).level = level;
        self.by_level[old as usize].retain(|&c| c != id);
        self.bucket(level).push(id);
    }

    fn bucket(&mut self, level: u32) -> &mut Vec<ConstraintId> {
        if self.by_level.len() <= level as usize {
            self.by_level.resize_with(level as usize + 1, Vec::new);
        }
        &mut self.by_level[level as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ConstraintStore, BoolState, DepManager) {
        (ConstraintStore::new(), BoolState::new(), DepManager::new())
    }

    #[test]
    fn test_dedup_shares_bvar() {
        let (mut store, mut bools, mut dm) = setup();
        let p = Poly::var(4, 0) + 1;
        let c1 = store.eq(&mut bools, &mut dm, 0, p.clone(), Dep::NULL);
        let c2 = store.eq(&mut bools, &mut dm, 0, p, Dep::NULL);
        assert_eq!(c1, c2);
        assert_eq!(store.blit(c1), store.blit(c2));
        assert_eq!(store.blit(!c1), !store.blit(c1));
    }

    #[test]
    fn test_ult_is_negated_ule() {
        let (mut store, mut bools, mut dm) = setup();
        let p = Poly::var(4, 0);
        let q = Poly::var(4, 1);
        let lt = store.ult(&mut bools, &mut dm, 0, p.clone(), q.clone(), Dep::NULL);
        let ge = store.ule(&mut bools, &mut dm, 0, q, p, Dep::NULL);
        assert!(!lt.positive);
        assert_eq!(!lt, ge);
    }

    #[test]
    fn test_signed_comparison_shift() {
        let (mut store, mut bools, mut dm) = setup();
        let p = Poly::var(4, 0);
        let q = Poly::zero(4);
        // x <=s 0 becomes x + 8 <=u 8 over width 4
        let le = store.sle(&mut bools, &mut dm, 0, p.clone(), q, Dep::NULL);
        match &store.get(le.id).kind {
            ConstraintKind::Ule(lhs, rhs) => {
                assert_eq!(*lhs, p + 8);
                assert_eq!(*rhs, Poly::val(4, 8));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_release_level_frees_bvars() {
        let (mut store, mut bools, mut dm) = setup();
        let p = Poly::var(4, 0) + 3;
        let c = store.eq(&mut bools, &mut dm, 2, p.clone(), Dep::NULL);
        store.register_external(9, c);
        assert!(store.is_live(c.id));
        store.release_level(2, &mut bools);
        assert!(!store.is_live(c.id));
        assert_eq!(store.lookup_external(9), None);
        // the key is free for re-interning
        let c2 = store.eq(&mut bools, &mut dm, 0, p, Dep::NULL);
        assert!(store.is_live(c2.id));
    }

    #[test]
    fn test_reintern_lowers_level() {
        let (mut store, mut bools, mut dm) = setup();
        let p = Poly::var(4, 0) + 3;
        let c1 = store.eq(&mut bools, &mut dm, 5, p.clone(), Dep::NULL);
        let c2 = store.eq(&mut bools, &mut dm, 1, p, Dep::NULL);
        assert_eq!(c1, c2);
        assert_eq!(store.get(c1.id).level, 1);
        store.release_level(2, &mut bools);
        assert!(store.is_live(c1.id));
    }
}
