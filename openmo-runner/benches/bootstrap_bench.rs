//! Criterion benchmarks for the bootstrap simulator.
//!
//! Run with: `cargo bench -p openmo-runner`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use openmo_runner::bootstrap::{run_bootstrap, BootstrapConfig};

fn synthetic_daily_pnl(days: usize) -> Vec<f64> {
    (0..days)
        .map(|i| ((i * 37) % 101) as f64 * 4.0 - 190.0)
        .collect()
}

fn bench_bootstrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("bootstrap");
    let pnl = synthetic_daily_pnl(60);

    for trials in [1_000usize, 10_000] {
        for parallel in [false, true] {
            let config = BootstrapConfig {
                num_trials: trials,
                keep_paths: false,
                parallel,
                ..BootstrapConfig::default()
            };
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, trials), &config, |b, cfg| {
                b.iter(|| run_bootstrap(black_box(&pnl), cfg).unwrap());
            });
        }
    }

    group.finish();
}

fn bench_bootstrap_with_paths(c: &mut Criterion) {
    let pnl = synthetic_daily_pnl(250);
    let config = BootstrapConfig::default();
    c.bench_function("bootstrap_1000x250_with_paths", |b| {
        b.iter(|| run_bootstrap(black_box(&pnl), &config).unwrap());
    });
}

criterion_group!(benches, bench_bootstrap, bench_bootstrap_with_paths);
criterion_main!(benches);
