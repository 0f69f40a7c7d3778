//! Viable-membership constraints: a variable restricted to a fixed predicate.

use crate::constraint::SignedConstraint;
use crate::solver::Solver;
use crate::types::PVar;
use ringsat_math::{FindResult, NodeId};

/// Narrow: check an assigned variable against the predicate, or refine the
/// viable set of an unassigned one.
pub(crate) fn narrow(s: &mut Solver, c: SignedConstraint, v: PVar, pred: NodeId) {
    let width = s.var_width(v);
    let set = if c.positive {
        pred
    } else {
        s.fdd_mut(width).not(pred)
    };
    if s.is_assigned(v) {
        if !s.fdd_ref(width).contains(set, s.value[v as usize]) {
            s.set_conflict(c);
        }
        return;
    }
    s.push_cjust(v, c);
    s.intersect_viable(v, set);
    if s.is_conflict() {
        return;
    }
    if let FindResult::Singleton(val) = s.find_viable(v) {
        s.propagate_value(v, val, c);
    }
}
