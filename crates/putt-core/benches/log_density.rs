//! Criterion benchmarks for `putt-core`.
//!
//! The log posterior and its gradient dominate sampling time; the predictive
//! push dominates the report stage.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use putt_common::published_dataset;
use putt_config::{PredictiveConfig, SigmaPrior};
use putt_core::diagnostics::DrawLocation;
use putt_core::model::PuttingModel;
use putt_core::predictive::PredictiveAggregator;

fn bench_log_density(c: &mut Criterion) {
    let model = PuttingModel::new(&published_dataset(), SigmaPrior::default())
        .expect("published dataset builds a model");
    let mut group = c.benchmark_group("log_posterior");

    for sigma in [0.005, 0.0267, 0.2] {
        group.bench_with_input(BenchmarkId::new("density", sigma), &sigma, |b, &s| {
            b.iter(|| black_box(model.log_posterior_density(black_box(s))));
        });
        group.bench_with_input(BenchmarkId::new("gradient", sigma), &sigma, |b, &s| {
            b.iter(|| black_box(model.log_posterior_gradient(black_box(s))));
        });
    }

    group.finish();
}

fn bench_predictive_push(c: &mut Criterion) {
    let model = PuttingModel::new(&published_dataset(), SigmaPrior::default())
        .expect("published dataset builds a model");
    let config = PredictiveConfig::default();

    c.bench_function("predictive_push_1000", |b| {
        b.iter(|| {
            let mut agg = PredictiveAggregator::new(&model, &config, 1000).expect("aggregator");
            for i in 0..1000 {
                let sigma = 0.0267 + 1e-6 * i as f64;
                agg.push(DrawLocation { chain: 0, iteration: i }, sigma)
                    .expect("valid sigma");
            }
            black_box(agg.finish());
        });
    });
}

criterion_group!(benches, bench_log_density, bench_predictive_push);
criterion_main!(benches);
