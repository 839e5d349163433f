//! Compare single-worker vs all-core Monte Carlo tallies.
//!
//! Run with: `cargo bench --bench monte_carlo_parallel`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spacebattle::analysis::{tally_outcomes, SimulationPlan};
use spacebattle::combat::{ExcitingBattle, StateId};
use spacebattle::parallel::WorkerPool;

fn bench_monte_carlo_sequential_vs_parallel(c: &mut Criterion) {
    let battle = ExcitingBattle::new().expect("exciting battle");
    let start = StateId::new(1).expect("state 1");
    let trials = 20_000;
    let seed = 42u64;

    let mut group = c.benchmark_group("monte_carlo");
    group.sample_size(20);
    group.measurement_time(std::time::Duration::from_secs(10));

    let mut sequential = SimulationPlan::new(trials, seed);
    sequential.pool = WorkerPool::with_workers(1);
    group.bench_function("sequential", |b| {
        b.iter(|| black_box(tally_outcomes(&battle, start, &sequential)));
    });

    let parallel = SimulationPlan::new(trials, seed);
    group.bench_function("parallel", |b| {
        b.iter(|| black_box(tally_outcomes(&battle, start, &parallel)));
    });

    group.finish();
}

criterion_group!(benches, bench_monte_carlo_sequential_vs_parallel);
criterion_main!(benches);
