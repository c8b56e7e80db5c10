//! Performance benchmarks for table building and strategy sweeps.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fundsim::engine::{BacktestConfig, BacktestEngine};
use fundsim::features::FeatureSet;
use fundsim::strategies::{feature_weights, TopByFeature, WeightedMultiFeature};
use fundsim::sweep::{IntRange, StrategySweep, SweepGrid};
use fundsim::types::{Direction, FeatureKind, FundRecord};
use fundsim::universe::Universe;

/// Generate synthetic fund histories of varying ages.
fn generate_funds(count: usize, months: usize) -> Vec<FundRecord> {
    (0..count)
        .map(|f| {
            let age = months - (f * 7) % (months / 2);
            let monthly = (0..age)
                .map(|m| {
                    let noise = ((m as f64 * 0.7 + f as f64).sin() * 2.0
                        + (m as f64 * 1.3).cos())
                        * 0.005;
                    1.0 + 0.001 * (f % 7) as f64 + noise
                })
                .collect();
            FundRecord::new(format!("fund-{}", f), monthly)
        })
        .collect()
}

/// Benchmark feature and universe construction.
fn bench_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("tables");

    for months in [60, 120, 240].iter() {
        let monthly = generate_funds(1, *months).remove(0).monthly;
        group.bench_with_input(
            BenchmarkId::new("feature_set", months),
            &monthly,
            |b, monthly| b.iter(|| FeatureSet::build(black_box(monthly))),
        );
    }

    group.sample_size(10);
    for funds in [20, 50].iter() {
        let records = generate_funds(*funds, 120);
        group.bench_with_input(
            BenchmarkId::new("universe_120m", funds),
            &records,
            |b, records| b.iter(|| Universe::build(black_box(records.clone()))),
        );
    }

    group.finish();
}

/// Benchmark single backtests.
fn bench_backtest(c: &mut Criterion) {
    let universe = Universe::build(generate_funds(50, 120)).unwrap();
    let config = BacktestConfig::default();
    let engine = BacktestEngine::new(&universe, &config);

    let mut group = c.benchmark_group("backtest");

    group.bench_function("top_return_5", |b| {
        b.iter(|| {
            let mut strategy =
                TopByFeature::new(5, FeatureKind::Return, Direction::Highest, 12, 12);
            engine.run(black_box(&mut strategy))
        })
    });

    group.bench_function("weighted_5", |b| {
        let weights = feature_weights(&[(FeatureKind::Return, 1.0), (FeatureKind::StdDev, -0.5)]);
        b.iter(|| {
            let mut strategy = WeightedMultiFeature::new(5, weights.clone(), 12, 12).unwrap();
            engine.run(black_box(&mut strategy))
        })
    });

    group.finish();
}

/// Benchmark a small parallel sweep.
fn bench_sweep(c: &mut Criterion) {
    let universe = Universe::build(generate_funds(30, 96)).unwrap();
    let config = BacktestConfig::default();
    let grid = SweepGrid {
        fund_counts: IntRange::new(1, 5, 2),
        lookbacks: IntRange::new(0, 24, 12),
        min_histories: IntRange::new(0, 24, 12),
        ..Default::default()
    };
    let specs = grid.generate();

    let mut group = c.benchmark_group("sweep");
    group.sample_size(10); // Fewer samples for slow benchmarks

    group.bench_function(format!("grid_{}", specs.len()), |b| {
        let sweep = StrategySweep::new(&universe, &config).with_seed(1);
        b.iter(|| sweep.run(black_box(&specs)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_tables, bench_backtest, bench_sweep);
criterion_main!(benches);
