//! Criterion micro-benchmarks for per-tick projections and statistics.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use quarry_bench::{reference_executor, stress_executor};
use quarry_core::Side;
use quarry_engine::Stats;

fn bench_project(c: &mut Criterion) {
    for (label, mut exec) in [
        ("4", reference_executor(42).unwrap()),
        ("64", stress_executor(42).unwrap()),
    ] {
        let session = exec.setup_session();
        c.bench_function(&format!("project_entity_{label}_members"), |b| {
            b.iter(|| black_box(exec.project(&session, Side::Entity)));
        });
        c.bench_function(&format!("project_group_{label}_members"), |b| {
            b.iter(|| black_box(exec.project(&session, Side::Group)));
        });
        c.bench_function(&format!("full_clone_{label}_members"), |b| {
            b.iter(|| black_box(session.clone()));
        });
    }
}

fn bench_stats_10k(c: &mut Criterion) {
    c.bench_function("stats_add_10k", |b| {
        b.iter(|| {
            let mut stats = Stats::new("bench");
            stats.extend((0..10_000).map(f64::from));
            black_box(stats.std_error())
        });
    });
}

criterion_group!(benches, bench_project, bench_stats_10k);
criterion_main!(benches);
