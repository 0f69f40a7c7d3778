//! Viable-set maintenance for integer variables.
//!
//! Each variable carries a predicate over its domain holding the values still
//! permitted by the narrowed constraints. Refinements snapshot the previous
//! predicate on the trail; an empty intersection raises a conflict on the
//! variable, whose `cjust` list then explains the exclusion.

use crate::solver::Solver;
use crate::trail::TrailInstr;
use crate::types::PVar;
use ringsat_math::NodeId;
use tracing::trace;

impl Solver {
    /// Is `val` still permitted for `v`?
    pub(crate) fn is_viable(&self, v: PVar, val: u64) -> bool {
        self.fdd_ref(self.width[v as usize])
            .contains(self.viable[v as usize], val)
    }

    /// Refine `v`'s viable set with `pred`, snapshotting the previous set.
    ///
    /// Raises a conflict on `v` when the intersection becomes empty.
    pub(crate) fn intersect_viable(&mut self, v: PVar, pred: NodeId) {
        let prev = self.viable[v as usize];
        let width = self.width[v as usize];
        let next = self.fdd_mut(width).and(prev, pred);
        self.trail.push(TrailInstr::Viable { var: v, prev });
        self.viable[v as usize] = next;
        trace!(var = v, "viable refinement");
        if next == NodeId::FALSE {
            self.set_conflict_var(v);
        }
    }

    /// Exclude a single value from `v`'s viable set.
    pub(crate) fn add_non_viable(&mut self, v: PVar, val: u64) {
        trace!(var = v, val, "exclude value");
        let width = self.width[v as usize];
        let pred = self.fdd_mut(width).ne_val(val);
        self.intersect_viable(v, pred);
    }

    /// Remember that `c` contributed to `v`'s current viable set.
    pub(crate) fn push_cjust(&mut self, v: PVar, c: crate::constraint::SignedConstraint) {
        self.cjust[v as usize].push(c);
        self.trail.push(TrailInstr::Cjust { var: v });
    }
}
