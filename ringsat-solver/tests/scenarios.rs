//! End-to-end solving scenarios.
//!
//! Small linear systems that propagate without search, systems needing
//! decisions and conflict resolution, unsatisfiable cores, and modular
//! wrap-around edge cases.

use ringsat_solver::{Poly, SatResult, Solver};

/// Check that an asserted equality `p = 0` holds in the final model.
fn assert_eq_holds(s: &Solver, p: &Poly) {
    assert_eq!(s.try_eval(p), Some(0), "model violates {p} = 0");
}

#[test]
fn linear_unit_propagation() {
    // a + 1 = 0 over Z/4: the value is fixed at 3, no search happens.
    let mut s = Solver::new();
    let a = s.add_var(2);
    s.add_eq(s.var(a) + 1, None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq!(s.value_of(a), Some(3));
    let stats = s.collect_statistics();
    assert_eq!(stats.decisions, 0, "pure propagation should not decide");
    assert!(stats.propagations >= 1);
}

#[test]
fn linear_two_variables() {
    // 2a + b + 1 = 0 and 2b + a = 0 over Z/4 force a = 2, b = 3.
    let mut s = Solver::new();
    let a = s.add_var(2);
    let b = s.add_var(2);
    s.add_eq(s.var(a) * 2 + s.var(b) + 1, None);
    s.add_eq(s.var(b) * 2 + s.var(a), None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq!(s.value_of(a), Some(2));
    assert_eq!(s.value_of(b), Some(3));
}

#[test]
fn linear_underconstrained() {
    let mut s = Solver::new();
    let a = s.add_var(2);
    let b = s.add_var(2);
    let p = s.var(b) * 3 + s.var(a) + 2;
    s.add_eq(p.clone(), None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq_holds(&s, &p);
}

#[test]
fn even_coefficient_unsat() {
    // 4a + 2 = 0 over Z/8 has no solution: 4a is always 0 or 4.
    let mut s = Solver::new();
    let a = s.add_var(3);
    s.add_eq(s.var(a) * 4 + 2, 42u32);
    assert_eq!(s.check_sat(), SatResult::Unsat);
    assert_eq!(s.unsat_core(), vec![42]);
    assert_eq!(s.collect_statistics().decisions, 0);
}

#[test]
fn two_equations_shared_solution() {
    // a + 2b + 4 = 0 and a + 4b + 4 = 0 over Z/8 meet at a = 4, b in {0, 4}.
    let mut s = Solver::new();
    let a = s.add_var(3);
    let b = s.add_var(3);
    let p1 = s.var(a) + s.var(b) * 2 + 4;
    let p2 = s.var(a) + s.var(b) * 4 + 4;
    s.add_eq(p1.clone(), None);
    s.add_eq(p2.clone(), None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq_holds(&s, &p1);
    assert_eq_holds(&s, &p2);
    assert_eq!(s.value_of(a), Some(4));
}

#[test]
fn quartic_no_roots() {
    // a*a*(a*a - 1) is 0 for every a mod 4, so adding 1 kills all values.
    let mut s = Solver::new();
    let a = s.add_var(2);
    let aa = s.var(a) * s.var(a);
    s.add_eq(aa.clone() * (aa - 1u64) + 1, None);
    assert_eq!(s.check_sat(), SatResult::Unsat);
}

#[test]
fn quadratic_with_roots() {
    // a*(a - 1) + 2 = 0 over Z/4 has solutions (a = 2 and a = 3).
    let mut s = Solver::new();
    let a = s.add_var(2);
    let p = s.var(a) * (s.var(a) - 1u64) + 2;
    s.add_eq(p.clone(), None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq_holds(&s, &p);
}

#[test]
fn division_relation_unsat() {
    // u = v*q + r with r < u and v*q > u is contradictory over Z/32:
    // without wrap-around u >= v*q, with wrap-around u < r.
    let mut s = Solver::new();
    let u = s.add_var(5);
    let v = s.add_var(5);
    let q = s.add_var(5);
    let r = s.add_var(5);
    s.add_eq(s.var(u) - s.var(v) * s.var(q) - s.var(r), None);
    s.add_ult(s.var(r), s.var(u), None);
    s.add_ult(s.var(u), s.var(v) * s.var(q), None);
    assert_eq!(s.check_sat(), SatResult::Unsat);
}

#[test]
fn width_one_decides_and_conflicts() {
    let mut s = Solver::new();
    let x = s.add_var(1);
    let y = s.add_var(1);
    s.add_eq(s.var(x) + s.var(y) + 1, None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    let (xv, yv) = (s.value_of(x).unwrap(), s.value_of(y).unwrap());
    assert_eq!((xv + yv + 1) & 1, 0);

    let mut s = Solver::new();
    let x = s.add_var(1);
    s.add_eq(s.var(x), None);
    s.add_diseq(s.var(x), None);
    assert_eq!(s.check_sat(), SatResult::Unsat);
}

#[test]
fn wraparound_forces_max_value() {
    for width in [2u32, 5, 16, 64] {
        let mut s = Solver::new();
        let v = s.add_var(width);
        s.add_eq(s.var(v) + 1, None);
        assert_eq!(s.check_sat(), SatResult::Sat, "width {width}");
        let expected = if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        assert_eq!(s.value_of(v), Some(expected), "width {width}");
    }
}

#[test]
fn ground_contradiction_on_insertion() {
    // A constraint that is already a false constant conflicts immediately.
    let mut s = Solver::new();
    let _ = s.add_var(4);
    s.add_eq(Poly::val(4, 7), 3u32);
    assert_eq!(s.check_sat(), SatResult::Unsat);
    assert_eq!(s.unsat_core(), vec![3]);

    // And a true constant changes nothing.
    let mut s = Solver::new();
    let a = s.add_var(4);
    s.add_eq(Poly::val(4, 16), None);
    s.add_eq(s.var(a) + 5, None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq!(s.value_of(a), Some(11));
}

#[test]
fn duplicate_assertion_is_idempotent() {
    let mut once = Solver::new();
    let a = once.add_var(3);
    once.add_eq(once.var(a) * 3 + 1, None);
    assert_eq!(once.check_sat(), SatResult::Sat);

    let mut twice = Solver::new();
    let b = twice.add_var(3);
    twice.add_eq(twice.var(b) * 3 + 1, None);
    twice.add_eq(twice.var(b) * 3 + 1, None);
    assert_eq!(twice.check_sat(), SatResult::Sat);
    assert_eq!(once.value_of(a), twice.value_of(b));
}

#[test]
fn diseq_is_negated_eq() {
    // x != 0 over Z/4
    let mut s = Solver::new();
    let x = s.add_var(2);
    s.add_diseq(s.var(x), None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_ne!(s.value_of(x), Some(0));

    // x = 0 and x != 0 together are unsat
    let mut s = Solver::new();
    let x = s.add_var(2);
    s.add_eq(s.var(x), 1u32);
    s.add_diseq(s.var(x), 2u32);
    assert_eq!(s.check_sat(), SatResult::Unsat);
    assert_eq!(s.unsat_core(), vec![1, 2]);
}

#[test]
fn unsigned_ordering_antisymmetric() {
    let mut s = Solver::new();
    let a = s.add_var(3);
    let b = s.add_var(3);
    s.add_ule(s.var(a), s.var(b), None);
    s.add_ule(s.var(b), s.var(a), None);
    s.add_diseq(s.var(a) - s.var(b), None);
    assert_eq!(s.check_sat(), SatResult::Unsat);
}

#[test]
fn unsigned_bounds_propagate() {
    // 5 <= a and a < 6 pin a to 5.
    let mut s = Solver::new();
    let a = s.add_var(4);
    s.add_ule(Poly::val(4, 5), s.var(a), None);
    s.add_ult(s.var(a), Poly::val(4, 6), None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq!(s.value_of(a), Some(5));
}

#[test]
fn signed_comparisons() {
    // a <=s 0 and 0 <=s a pin a to 0.
    let mut s = Solver::new();
    let a = s.add_var(4);
    s.add_sle(s.var(a), Poly::zero(4), None);
    s.add_sle(Poly::zero(4), s.var(a), None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq!(s.value_of(a), Some(0));

    // a <s 0 makes the sign bit mandatory.
    let mut s = Solver::new();
    let a = s.add_var(4);
    s.add_slt(s.var(a), Poly::zero(4), None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert!(s.value_of(a).unwrap() >= 8);
}

#[test]
fn push_pop_is_a_noop() {
    let mut s = Solver::new();
    let a = s.add_var(3);
    s.add_eq(s.var(a) + 2, None);
    s.push();
    s.pop(1);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq!(s.value_of(a), Some(6));
    s.check_invariants();
}

#[test]
fn pop_discards_scoped_assertions() {
    let mut s = Solver::new();
    let a = s.add_var(3);
    s.add_eq(s.var(a) + 2, None);
    assert_eq!(s.check_sat(), SatResult::Sat);

    s.push();
    s.add_diseq(s.var(a) + 2, None); // contradicts the base assertion
    assert_eq!(s.check_sat(), SatResult::Unsat);
    s.pop(1);

    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq!(s.value_of(a), Some(6));
}

#[test]
fn nested_scopes_release_in_order() {
    let mut s = Solver::new();
    let a = s.add_var(4);
    s.add_ule(s.var(a), Poly::val(4, 9), None);
    s.push();
    s.add_ule(Poly::val(4, 4), s.var(a), None);
    s.push();
    s.add_eq(s.var(a) - 7, None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq!(s.value_of(a), Some(7));
    s.pop(2);
    assert_eq!(s.check_sat(), SatResult::Sat);
    let v = s.value_of(a).unwrap();
    assert!(v <= 9);
}

#[test]
fn resource_limit_returns_unknown_and_resumes() {
    use ringsat_solver::{ResourceLimits, UnknownReason};
    let mut s = Solver::with_limits(ResourceLimits {
        max_iterations: Some(0),
        ..ResourceLimits::default()
    });
    let a = s.add_var(2);
    s.add_eq(s.var(a) + 1, None);
    assert_eq!(
        s.check_sat(),
        SatResult::Unknown(UnknownReason::Iterations)
    );
    s.resources_mut().set_limits(ResourceLimits::default());
    assert_eq!(s.check_sat(), SatResult::Sat);
    assert_eq!(s.value_of(a), Some(3));
}

#[test]
fn statistics_accumulate() {
    let mut s = Solver::new();
    let a = s.add_var(3);
    let b = s.add_var(3);
    s.add_eq(s.var(a) + s.var(b) * 2 + 4, None);
    s.add_eq(s.var(a) + s.var(b) * 4 + 4, None);
    assert_eq!(s.check_sat(), SatResult::Sat);
    let stats = s.collect_statistics();
    assert!(stats.iterations > 0);
    assert!(stats.decisions > 0, "this system needs search");
    assert!(stats.conflicts > 0, "wrong guesses must conflict");
}
