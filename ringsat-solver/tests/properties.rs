//! Property-based tests: models satisfy their constraints, and user scopes
//! behave like replaying only the surviving assertions.

use proptest::prelude::*;
use ringsat_solver::{Poly, SatResult, Solver};

const WIDTH: u32 = 3;
const NUM_VARS: u32 = 3;

/// One `a*x + b <=u c*y + d` constraint, by raw coefficients.
#[derive(Debug, Clone, Copy)]
struct UleSpec {
    a: u64,
    x: u32,
    b: u64,
    c: u64,
    y: u32,
    d: u64,
}

fn ule_spec() -> impl Strategy<Value = UleSpec> {
    (
        0u64..8,
        0u32..NUM_VARS,
        0u64..8,
        0u64..8,
        0u32..NUM_VARS,
        0u64..8,
    )
        .prop_map(|(a, x, b, c, y, d)| UleSpec { a, x, b, c, y, d })
}

fn sides(s: &Solver, vars: &[ringsat_solver::PVar], spec: UleSpec) -> (Poly, Poly) {
    let lhs = s.var(vars[spec.x as usize]) * spec.a + spec.b;
    let rhs = s.var(vars[spec.y as usize]) * spec.c + spec.d;
    (lhs, rhs)
}

proptest! {
    /// Whenever the solver answers sat, every asserted inequality holds
    /// under the returned assignment.
    #[test]
    fn sat_models_satisfy_ule_constraints(specs in prop::collection::vec(ule_spec(), 1..8)) {
        let mut s = Solver::new();
        let vars: Vec<_> = (0..NUM_VARS).map(|_| s.add_var(WIDTH)).collect();
        for &spec in &specs {
            let (lhs, rhs) = sides(&s, &vars, spec);
            s.add_ule(lhs, rhs, None);
        }
        if s.check_sat() == SatResult::Sat {
            for &spec in &specs {
                let (lhs, rhs) = sides(&s, &vars, spec);
                let lv = s.try_eval(&lhs).expect("model must be total");
                let rv = s.try_eval(&rhs).expect("model must be total");
                prop_assert!(lv <= rv, "{lhs} = {lv} > {rhs} = {rv}");
            }
        }
    }

    /// A push/add/pop history gives the same answer as asserting only the
    /// additions that survive all pops.
    #[test]
    fn scopes_bisimulate_replay(
        prefix in prop::collection::vec(ule_spec(), 0..4),
        scoped in prop::collection::vec(ule_spec(), 0..4),
        suffix in prop::collection::vec(ule_spec(), 0..3),
    ) {
        let mut scoped_solver = Solver::new();
        let vars: Vec<_> = (0..NUM_VARS).map(|_| scoped_solver.add_var(WIDTH)).collect();
        for &spec in &prefix {
            let (lhs, rhs) = sides(&scoped_solver, &vars, spec);
            scoped_solver.add_ule(lhs, rhs, None);
        }
        scoped_solver.push();
        for &spec in &scoped {
            let (lhs, rhs) = sides(&scoped_solver, &vars, spec);
            scoped_solver.add_ule(lhs, rhs, None);
        }
        scoped_solver.pop(1);
        for &spec in &suffix {
            let (lhs, rhs) = sides(&scoped_solver, &vars, spec);
            scoped_solver.add_ule(lhs, rhs, None);
        }

        let mut replayed = Solver::new();
        let rvars: Vec<_> = (0..NUM_VARS).map(|_| replayed.add_var(WIDTH)).collect();
        for &spec in prefix.iter().chain(&suffix) {
            let (lhs, rhs) = sides(&replayed, &rvars, spec);
            replayed.add_ule(lhs, rhs, None);
        }

        prop_assert_eq!(scoped_solver.check_sat(), replayed.check_sat());
    }

    /// Random equalities: a sat answer carries a model of every equation.
    #[test]
    fn sat_models_satisfy_equalities(
        eqs in prop::collection::vec(
            (0u64..8, 0u32..NUM_VARS, 0u64..8, 0u32..NUM_VARS, 0u64..8),
            1..5,
        )
    ) {
        let mut s = Solver::new();
        let vars: Vec<_> = (0..NUM_VARS).map(|_| s.add_var(WIDTH)).collect();
        let mk = |s: &Solver, (a, x, b, y, c): (u64, u32, u64, u32, u64)| {
            s.var(vars[x as usize]) * a + s.var(vars[y as usize]) * b + c
        };
        for &e in &eqs {
            let p = mk(&s, e);
            s.add_eq(p, None);
        }
        if s.check_sat() == SatResult::Sat {
            for &e in &eqs {
                let p = mk(&s, e);
                prop_assert_eq!(s.try_eval(&p), Some(0), "model violates {} = 0", p);
            }
        }
    }
}
