//! Conflict explanation with forbidden intervals.
//!
//! For a conflict variable `v`, every constraint that is unary in `v` under
//! the current assignment forbids a half-open modular interval of values
//! (with a ground side condition). If a greedily chosen sequence of such
//! intervals covers all of ℤ/2^w, no value for `v` can exist, and the lemma
//! records why: negations of the interval sources, the side conditions, and
//! for each adjacent pair a literal placing one interval's end inside the
//! next, using `t in [l,h) <=> t - l <u h - l`.

use crate::clause::Clause;
use crate::constraint::{eq, ule, ConstraintKind, SignedConstraint};
use crate::dep::Dep;
use crate::solver::Solver;
use crate::types::PVar;
use ringsat_math::{modular, Poly};
use tracing::{debug, trace};

/// A half-open modular interval with symbolic bounds and their current
/// values.
#[derive(Debug, Clone)]
pub(crate) struct FiInterval {
    pub(crate) lo: Poly,
    pub(crate) lo_val: u64,
    pub(crate) hi: Poly,
    pub(crate) hi_val: u64,
}

impl FiInterval {
    /// `x in [lo, hi)` via `x - lo <u hi - lo`.
    fn contains(&self, x: u64, width: u32) -> bool {
        modular::sub(x, self.lo_val, width) < modular::sub(self.hi_val, self.lo_val, width)
    }

    fn len(&self, width: u32) -> u64 {
        modular::sub(self.hi_val, self.lo_val, width)
    }
}

/// Outcome of a forbidden-interval query.
#[derive(Debug, Clone)]
pub(crate) enum FiOut {
    /// The constraint is never violated here; it contributes nothing.
    Empty,
    /// The constraint is violated for every value of the variable.
    Full,
    /// Violated exactly on a proper interval.
    Proper(FiInterval),
}

/// Negation of the side condition under which an interval is valid.
pub(crate) type SideCond = Option<SignedConstraint>;

struct FiRecord {
    interval: FiInterval,
    side: SideCond,
    src: SignedConstraint,
}

impl Solver {
    /// Try to explain the conflict on `v` as a covering of its domain by
    /// forbidden intervals drawn from the conflict core and `extra`
    /// (typically a snapshot of `cjust[v]`). Returns the lemma clause.
    pub(crate) fn explain_intervals(
        &mut self,
        v: PVar,
        extra: &[SignedConstraint],
    ) -> Option<Clause> {
        let width = self.width[v as usize];

        let mut sources: Vec<SignedConstraint> = self.conflict.constraints.clone();
        for &c in extra {
            if !sources.contains(&c) {
                sources.push(c);
            }
        }

        let mut records: Vec<FiRecord> = Vec::new();
        let mut full: Option<(SideCond, SignedConstraint)> = None;
        for c in sources {
            let kind = self.store.get(c.id).kind.clone();
            let out = match &kind {
                ConstraintKind::Eq(p) => eq::forbidden_interval(self, c, p, v),
                ConstraintKind::Ule(p, q) => ule::forbidden_interval(self, c, p, q, v),
                ConstraintKind::Member(..) => None,
            };
            let Some((out, side)) = out else { continue };
            trace!(constraint = %self.store.describe(c), ?out, "forbidden interval");
            match out {
                FiOut::Empty => continue,
                FiOut::Full => {
                    full = Some((side, c));
                    break;
                }
                FiOut::Proper(interval) => records.push(FiRecord {
                    interval,
                    side,
                    src: c,
                }),
            }
        }

        if let Some((side, src)) = full {
            // One constraint forbids the whole domain; its side condition
            // alone explains the conflict.
            let data = self.store.get(src.id);
            let (level, dep) = (data.level, data.dep);
            let mut clause = Clause::new(level, dep, []);
            clause.push_unique(self.store.blit(!src));
            if let Some(sc) = side {
                clause.push_unique(self.store.blit(sc));
            }
            debug!(var = v, "full forbidden interval");
            return Some(clause);
        }

        if records.is_empty() {
            return None;
        }

        // The longest interval seeds the covering.
        let mut longest = 0;
        for (i, r) in records.iter().enumerate() {
            if r.interval.len(width) > records[longest].interval.len(width) {
                longest = i;
            }
        }

        // Greedy covering: extend the baseline with the interval reaching
        // farthest, until it re-enters the seed interval.
        let mut seq: Vec<usize> = Vec::new();
        let mut baseline = records[longest].interval.hi_val;
        while !records[longest].interval.contains(baseline, width) {
            let mut best_extent = 0u64;
            let mut furthest = None;
            for i in (0..records.len()).rev() {
                if records[i].interval.contains(baseline, width) {
                    let extent = modular::sub(records[i].interval.hi_val, baseline, width);
                    if extent > best_extent {
                        best_extent = extent;
                        furthest = Some(i);
                    }
                }
            }
            // A hole no interval covers: no explanation from here.
            let f = furthest?;
            seq.push(f);
            baseline = records[f].interval.hi_val;
        }
        debug_assert!(!seq.is_empty());
        if !records[seq[0]].interval.contains(baseline, width) {
            seq.push(longest);
        }

        let mut level = 0;
        let mut dep = Dep::NULL;
        for &i in &seq {
            let data = self.store.get(records[i].src.id);
            level = level.max(data.level);
            dep = self.dm.join(dep, data.dep);
        }

        let mut clause = Clause::new(level, dep, []);
        for &i in &seq {
            let lit = self.store.blit(!records[i].src);
            clause.push_unique(lit);
        }
        for si in (0..seq.len()).rev() {
            let i = seq[si];
            let next = seq[(si + 1) % seq.len()];
            // Negation of hi_i in [lo_next, hi_next), i.e.
            // hi_next - lo_next <=u hi_i - lo_next.
            let x = records[i].interval.hi.clone() - records[next].interval.lo.clone();
            let y = records[next].interval.hi.clone() - records[next].interval.lo.clone();
            let link = self
                .store
                .ule(&mut self.bools, &mut self.dm, level, y, x, Dep::NULL);
            let lit = self.store.blit(link);
            clause.push_unique(lit);
            if let Some(sc) = records[i].side {
                clause.push_unique(self.store.blit(sc));
            }
        }
        debug!(var = v, intervals = seq.len(), "interval covering lemma");
        Some(clause)
    }
}
