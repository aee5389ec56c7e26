//! Benchmarks for likelihood estimation.
//!
//! Run with: cargo bench -p tailrisk-models

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use tailrisk_core::{DistributionFamily, ModelSpec};
use tailrisk_models::{filter, GarchEstimator};

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn simulate_garch11(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (omega, alpha, beta) = (0.05, 0.08, 0.9);
    let mut h: f64 = omega / (1.0 - alpha - beta);
    (0..n)
        .map(|_| {
            let z: f64 = StandardNormal.sample(&mut rng);
            let a = h.sqrt() * z;
            h = omega + alpha * a * a + beta * h;
            a
        })
        .collect()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_fit(c: &mut Criterion) {
    let data = simulate_garch11(1257, 42);
    let estimator = GarchEstimator::new().with_std_errors(false);
    let mut group = c.benchmark_group("garch_fit");

    for family in [
        DistributionFamily::Normal,
        DistributionFamily::StudentT,
        DistributionFamily::SkewGed,
    ] {
        let spec = ModelSpec::new(0, 0, 1, 1, family);
        group.bench_with_input(BenchmarkId::from_parameter(family), &spec, |b, spec| {
            b.iter(|| estimator.fit(black_box(spec), black_box(&data)))
        });
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let data = simulate_garch11(1257, 7);
    let spec = ModelSpec::new(1, 1, 1, 1, DistributionFamily::StudentT);
    let fit = GarchEstimator::new()
        .with_std_errors(false)
        .fit(&spec, &data)
        .expect("benchmark fit");

    c.bench_function("garch_filter_arma11_garch11_std", |b| {
        b.iter(|| filter(black_box(&spec), black_box(fit.params()), black_box(&data)))
    });
}

criterion_group!(estimation, bench_fit, bench_filter);

criterion_main!(estimation);
