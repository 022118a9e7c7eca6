//! Criterion benchmarks for the gate passes
//!
//! Measures discovery, application, and synthesis on synthetic gate-rich
//! formulas.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use gatesimp::{ClauseStats, GateConfig, GateFinder, Lit, Solver, Subsumer, Var};

/// A formula with `num_gates` OR gates plus payload clauses that mention
/// the gate inputs, so discovery, shortening and contraction all have
/// work to do.
fn gate_circuit(num_gates: usize, seed: u64) -> (Solver, Subsumer) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let num_vars = 3 * num_gates + 8;
    let mut solver = Solver::new(num_vars);
    let mut sub = Subsumer::new(num_vars);

    let mut link = |solver: &mut Solver, sub: &mut Subsumer, lits: &[Lit]| {
        if let Some(idx) = solver.add_clause_int(lits, false, ClauseStats::default()) {
            let sorted: Vec<Lit> = solver.db().lits(idx).to_vec();
            sub.link_in_clause(idx, &sorted);
        }
    };

    for g in 0..num_gates {
        let w = Lit::positive(Var((3 * g) as u32));
        let a = Lit::positive(Var((3 * g + 1) as u32));
        let b = Lit::positive(Var((3 * g + 2) as u32));

        link(&mut solver, &mut sub, &[!w, a, b]);
        link(&mut solver, &mut sub, &[w, !a]);
        link(&mut solver, &mut sub, &[w, !b]);

        // Payload over the gate inputs and a few tail variables.
        let t1 = Lit::positive(Var((3 * num_gates + rng.gen_range(0..4)) as u32));
        let t2 = Lit::positive(Var((3 * num_gates + 4 + rng.gen_range(0..4)) as u32));
        link(&mut solver, &mut sub, &[a, b, t1, t2]);
        link(&mut solver, &mut sub, &[!a, t1, t2]);
        link(&mut solver, &mut sub, &[!b, t1, t2]);
    }

    (solver, sub)
}

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_or_gates");
    for num_gates in [50usize, 200, 800] {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_gates),
            &num_gates,
            |bch, &n| {
                let (mut solver, mut sub) = gate_circuit(n, 1);
                let mut finder = GateFinder::new(solver.num_vars(), GateConfig::default());
                bch.iter(|| {
                    finder.find_or_gates(black_box(&mut solver), &mut sub);
                    black_box(finder.store().len())
                })
            },
        );
    }
    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_gates");
    for num_gates in [50usize, 200] {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_gates),
            &num_gates,
            |bch, &n| {
                bch.iter(|| {
                    let (mut solver, mut sub) = gate_circuit(n, 2);
                    let mut finder = GateFinder::new(solver.num_vars(), GateConfig::default());
                    finder.find_or_gates(&mut solver, &mut sub);
                    black_box(finder.apply_gates(&mut solver, &mut sub))
                })
            },
        );
    }
    group.finish();
}

fn bench_extend(c: &mut Criterion) {
    let mut group = c.benchmark_group("extend_resolution");
    group.sample_size(20);
    for num_gates in [50usize, 200] {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_gates),
            &num_gates,
            |bch, &n| {
                bch.iter(|| {
                    let (mut solver, mut sub) = gate_circuit(n, 3);
                    let mut finder = GateFinder::new(solver.num_vars(), GateConfig::default());
                    solver.set_random_seed(7);
                    black_box(finder.extend_resolution(&mut solver, &mut sub))
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_discovery, bench_apply, bench_extend);
criterion_main!(benches);
