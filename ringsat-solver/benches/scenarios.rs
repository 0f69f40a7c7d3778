//! End-to-end solving benchmarks over the standard small scenarios.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ringsat_solver::{SatResult, Solver};

fn linear_system() -> SatResult {
    let mut s = Solver::new();
    let a = s.add_var(2);
    let b = s.add_var(2);
    s.add_eq(s.var(a) * 2 + s.var(b) + 1, None);
    s.add_eq(s.var(b) * 2 + s.var(a), None);
    s.check_sat()
}

fn quartic_unsat() -> SatResult {
    let mut s = Solver::new();
    let a = s.add_var(2);
    let aa = s.var(a) * s.var(a);
    s.add_eq(aa.clone() * (aa - 1u64) + 1, None);
    s.check_sat()
}

fn division_relation() -> SatResult {
    let mut s = Solver::new();
    let u = s.add_var(5);
    let v = s.add_var(5);
    let q = s.add_var(5);
    let r = s.add_var(5);
    s.add_eq(s.var(u) - s.var(v) * s.var(q) - s.var(r), None);
    s.add_ult(s.var(r), s.var(u), None);
    s.add_ult(s.var(u), s.var(v) * s.var(q), None);
    s.check_sat()
}

fn bench_scenarios(c: &mut Criterion) {
    c.bench_function("linear_system", |b| b.iter(|| black_box(linear_system())));
    c.bench_function("quartic_unsat", |b| b.iter(|| black_box(quartic_unsat())));
    c.bench_function("division_relation", |b| {
        b.iter(|| black_box(division_relation()))
    });
}

criterion_group!(benches, bench_scenarios);
criterion_main!(benches);
