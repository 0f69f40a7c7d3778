//! Value resolution by polynomial superposition.
//!
//! When a propagated variable `v` sits on top of the conflict, two equalities
//! mentioning `v` — one true under the model (typically from `cjust[v]`), one
//! false (from the core) — combine into a resolvent that cancels the leading
//! `v`-degree. A resolvent that is still false replaces the false equality in
//! the core; once no core constraint mentions `v`, the conflict no longer
//! depends on its value.

use crate::constraint::{ConstraintKind, SignedConstraint};
use crate::solver::Solver;
use crate::types::PVar;
use ringsat_math::Poly;
use tracing::{debug, trace};

impl Solver {
    /// One value-resolution step for `v`. In bailout mode this only collects
    /// `v`'s justifications into the core; otherwise a failed superposition
    /// enters bailout mode.
    pub(crate) fn resolve_value_step(&mut self, v: PVar) {
        if self.conflict.bailout {
            for c in self.cjust[v as usize].clone() {
                self.conflict.insert(c);
            }
            return;
        }
        let cjust = self.cjust[v as usize].clone();
        if !self.try_superpose(v, &cjust) {
            debug!(var = v, "value resolution failed, bailing out");
            self.stats.bailouts += 1;
            self.conflict.set_bailout();
        }
    }

    /// Replace one false equality of the core by a superposition resolvent.
    fn try_superpose(&mut self, v: PVar, cjust: &[SignedConstraint]) -> bool {
        let mut candidates: Vec<(SignedConstraint, Poly)> = Vec::new();
        let core = self.conflict.constraints.clone();
        for &sc in core.iter().chain(cjust) {
            if !sc.positive {
                continue;
            }
            let ConstraintKind::Eq(p) = &self.store.get(sc.id).kind else {
                continue;
            };
            if p.degree(v) == 0 {
                continue;
            }
            let p = p.clone();
            if self.eval_signed(sc) != Some(true) {
                continue;
            }
            if !candidates.iter().any(|(c, _)| *c == sc) {
                candidates.push((sc, p));
            }
        }
        if candidates.is_empty() {
            return false;
        }
        for &c2 in &core {
            if !c2.positive {
                continue;
            }
            let ConstraintKind::Eq(q) = &self.store.get(c2.id).kind else {
                continue;
            };
            if q.degree(v) == 0 {
                continue;
            }
            let q = q.clone();
            if self.eval_signed(c2) != Some(false) {
                continue;
            }
            for (c1, p) in &candidates {
                if c1.id == c2.id {
                    continue;
                }
                let r = if p.degree(v) <= q.degree(v) {
                    p.resolve(v, &q)
                } else {
                    q.resolve(v, p)
                };
                let Some(r) = r else { continue };
                if r.is_zero() {
                    continue;
                }
                // The resolvent must keep the core conflicting.
                let Some(rv) = self.try_eval(&r) else { continue };
                if rv == 0 {
                    continue;
                }
                trace!(resolvent = %r, "superposition");
                let d1 = self.store.get(c1.id);
                let d2 = self.store.get(c2.id);
                let level = d1.level.max(d2.level);
                let (dep1, dep2) = (d1.dep, d2.dep);
                let dep = self.dm.join(dep1, dep2);
                let rc = self.store.eq(&mut self.bools, &mut self.dm, level, r, dep);
                debug!(
                    eliminated = %self.store.describe(c2),
                    resolvent = %self.store.describe(rc),
                    "superposition step"
                );
                self.conflict.replace(c2, *c1, rc);
                return true;
            }
        }
        false
    }
}
