//! Criterion benchmarks for `putt-math`.
//!
//! Focus on the kernels evaluated once per observation per log-density call.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use putt_math::{binomial_log_pmf_from_logs, central_log_mass};

fn bench_normal_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("normal");

    // Typical z = capture angle / sigma regimes: long putts, mid range, tap-ins.
    for (name, z) in [("long", 0.25), ("mid", 1.2), ("short", 3.5), ("tail", 25.0)] {
        group.bench_with_input(BenchmarkId::new("central_log_mass", name), &z, |b, &z| {
            b.iter(|| black_box(central_log_mass(black_box(z))));
        });
    }

    group.bench_function("binomial_log_pmf_from_logs", |b| {
        let (log_p, log_q) = central_log_mass(1.2);
        b.iter(|| {
            black_box(binomial_log_pmf_from_logs(
                black_box(111),
                black_box(240),
                black_box(log_p),
                black_box(log_q),
            ))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_normal_kernels);
criterion_main!(benches);
