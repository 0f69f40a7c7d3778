//! Unsigned `<=` constraints and their forbidden-interval characterization.

use crate::constraint::SignedConstraint;
use crate::dep::Dep;
use crate::intervals::{FiInterval, FiOut, SideCond};
use crate::solver::Solver;
use crate::types::PVar;
use ringsat_math::{modular, FindResult, Poly};

/// Narrow after a variable assignment or on activation.
///
/// Ground: compare the evaluated sides against the sign. Unary
/// `a*x + b <=u c*x + d`: refine the viable set of `x` with the solution
/// predicate and propagate a singleton.
pub(crate) fn narrow(s: &mut Solver, c: SignedConstraint, p: &Poly, q: &Poly) {
    let asn = s.assignment_vec();
    let pv = p.subst_val(&asn);
    let qv = q.subst_val(&asn);
    if let (Some(a), Some(b)) = (pv.as_val(), qv.as_val()) {
        if (a <= b) != c.positive {
            s.set_conflict(c);
        }
        return;
    }
    let params = match (pv.as_unilinear(), pv.as_val(), qv.as_unilinear(), qv.as_val()) {
        (Some(u1), _, Some(u2), _) if u1.var == u2.var => {
            Some((u1.var, u1.scale, u1.offset, u2.scale, u2.offset))
        }
        (Some(u1), _, None, Some(d)) => Some((u1.var, u1.scale, u1.offset, 0, d)),
        (None, Some(b), Some(u2), _) => Some((u2.var, 0, b, u2.scale, u2.offset)),
        _ => None,
    };
    let Some((v, a, b, cc, d)) = params else {
        return;
    };
    let width = s.var_width(v);
    let pred = {
        let f = s.fdd_mut(width);
        let n = f.affine_ule(a, b, cc, d);
        if c.positive {
            n
        } else {
            f.not(n)
        }
    };
    s.push_cjust(v, c);
    s.intersect_viable(v, pred);
    if s.is_conflict() {
        return;
    }
    if let FindResult::Singleton(val) = s.find_viable(v) {
        s.propagate_value(v, val, c);
    }
}

/// Forbidden interval of `lhs <=u rhs` (with the constraint's sign) in `v`.
///
/// Case analysis on which side carries `v`, after factoring `side = a*v + e`.
/// Works when the coefficient of `v` is 0, 1 or -1 and equal on both sides
/// where both carry `v`; anything else has no interval characterization and
/// the explainer falls back. The returned side condition is the *negation*
/// of the condition under which the interval is valid.
pub(crate) fn forbidden_interval(
    s: &mut Solver,
    c: SignedConstraint,
    lhs: &Poly,
    rhs: &Poly,
    v: PVar,
) -> Option<(FiOut, SideCond)> {
    let deg1 = lhs.degree(v);
    let deg2 = rhs.degree(v);
    if deg1 > 1 || deg2 > 1 || (deg1 == 0 && deg2 == 0) {
        return None;
    }
    let width = s.var_width(v);
    let minus_one = modular::mask(width);

    let (p1, e1) = if deg1 == 0 {
        (Poly::zero(width), lhs.clone())
    } else {
        lhs.factor(v, 1)
    };
    let (p2, e2) = if deg2 == 0 {
        (Poly::zero(width), rhs.clone())
    } else {
        rhs.factor(v, 1)
    };
    let a1 = p1.as_val()?;
    let a2 = p2.as_val()?;
    if a1 != 0 && a1 != 1 && a1 != minus_one {
        return None;
    }
    if a2 != 0 && a2 != 1 && a2 != minus_one {
        return None;
    }
    if a1 != 0 && a2 != 0 && a1 != a2 {
        return None;
    }
    let y_coeff = if a1 != 0 { a1 } else { a2 };
    // The rest of the constraint must evaluate under the current assignment.
    let b1 = s.try_eval(&e1)?;
    let b2 = s.try_eval(&e2)?;

    // Violation region of e1 + t <= e2 + t' as a function of t = y_coeff*v.
    let (is_trivial, cond_body, lo, lo_val, hi, hi_val) = if a2 == 0 {
        // e1 + t <= e2: never violated iff e2 = -1
        (
            b2 == minus_one,
            e2.clone() + 1,
            e2.clone() - e1.clone() + 1,
            modular::add(modular::sub(b2, b1, width), 1, width),
            -e1.clone(),
            modular::neg(b1, width),
        )
    } else if a1 == 0 {
        // e1 <= e2 + t: never violated iff e1 = 0
        (
            b1 == 0,
            e1.clone(),
            -e2.clone(),
            modular::neg(b2, width),
            e1.clone() - e2.clone(),
            modular::sub(b1, b2, width),
        )
    } else {
        // e1 + t <= e2 + t: never violated iff e1 = e2
        (
            b1 == b2,
            e1.clone() - e2.clone(),
            -e2.clone(),
            modular::neg(b2, width),
            -e1.clone(),
            modular::neg(b1, width),
        )
    };

    let side_cond = if cond_body.is_val() {
        None
    } else {
        let level = s.store.get(c.id).level;
        let cond = s
            .store
            .eq(&mut s.bools, &mut s.dm, level, cond_body, Dep::NULL);
        Some(if is_trivial { !cond } else { cond })
    };

    if is_trivial {
        let out = if c.positive { FiOut::Empty } else { FiOut::Full };
        return Some((out, side_cond));
    }

    let (mut lo, mut lo_val, mut hi, mut hi_val) = (lo, lo_val, hi, hi_val);
    if y_coeff == minus_one {
        // t in [l,h) <=> -t in [1-h, 1-l)
        let new_lo = Poly::val(width, 1) - hi;
        let new_hi = Poly::val(width, 1) - lo;
        let new_lo_val = modular::sub(1, hi_val, width);
        let new_hi_val = modular::sub(1, lo_val, width);
        lo = new_lo;
        hi = new_hi;
        lo_val = new_lo_val;
        hi_val = new_hi_val;
    }
    if !c.positive {
        // The negated constraint is violated on the complement.
        std::mem::swap(&mut lo, &mut hi);
        std::mem::swap(&mut lo_val, &mut hi_val);
    }
    debug_assert_ne!(lo_val, hi_val);
    Some((
        FiOut::Proper(FiInterval {
            lo,
            lo_val,
            hi,
            hi_val,
        }),
        side_cond,
    ))
}
