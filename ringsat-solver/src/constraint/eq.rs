//! Equality constraints `p = 0` (and their negations, disequalities).

use crate::constraint::{ule, SignedConstraint};
use crate::intervals::{FiOut, SideCond};
use crate::solver::Solver;
use crate::types::PVar;
use ringsat_math::{FindResult, Poly};

/// Narrow after a variable assignment or on activation.
///
/// Ground: check the sign. Unary `a*x + b = 0`: refine the viable set of `x`
/// with the solution set of the congruence and propagate a singleton.
pub(crate) fn narrow(s: &mut Solver, c: SignedConstraint, p: &Poly) {
    let r = p.subst_val(&s.assignment_vec());
    if let Some(val) = r.as_val() {
        if (val == 0) != c.positive {
            s.set_conflict(c);
        }
        return;
    }
    let Some(u) = r.as_unilinear() else {
        return;
    };
    let width = s.var_width(u.var);
    let pred = {
        let f = s.fdd_mut(width);
        let n = f.affine_eq_zero(u.scale, u.offset);
        if c.positive {
            n
        } else {
            f.not(n)
        }
    };
    s.push_cjust(u.var, c);
    s.intersect_viable(u.var, pred);
    if s.is_conflict() {
        return;
    }
    if let FindResult::Singleton(val) = s.find_viable(u.var) {
        s.propagate_value(u.var, val, c);
    }
}

/// Forbidden interval of `p = 0` in `v`, via the view `p <=u 0`.
pub(crate) fn forbidden_interval(
    s: &mut Solver,
    c: SignedConstraint,
    p: &Poly,
    v: PVar,
) -> Option<(FiOut, SideCond)> {
    let zero = Poly::zero(p.width());
    ule::forbidden_interval(s, c, p, &zero, v)
}
