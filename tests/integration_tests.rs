//! Integration tests for loading, backtesting and sweeping.

use std::io::Write;
use std::sync::Arc;

use fundsim::analytics::{Aggregation, ReturnMeasure, NOT_COMPUTABLE};
use fundsim::benchmark::{BenchmarkComparison, IndexSeries};
use fundsim::config::SweepFileConfig;
use fundsim::data::{load_funds, load_predictions, DataConfig};
use fundsim::engine::{BacktestConfig, BacktestEngine};
use fundsim::export::export_results;
use fundsim::optimize::{OptimizerConfig, WeightOptimizer};
use fundsim::strategies::{
    feature_weights, EqualWeightAll, FixedIndices, PredictionTable, StrategySpec, TopByFeature,
    WeightedMultiFeature,
};
use fundsim::strategy::{SelectionContext, SelectionStrategy};
use fundsim::sweep::{IntRange, StrategySweep, SweepGrid};
use fundsim::types::{Direction, FeatureKind, FundRecord};
use fundsim::universe::Universe;
use tempfile::{NamedTempFile, TempDir};

fn eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Two funds whose oldest-first histories are `[1.1, 0.9]` and `[1.1, 1.2]`.
fn two_funds() -> Universe {
    Universe::build(vec![
        FundRecord::new("first", vec![0.9, 1.1]),
        FundRecord::new("second", vec![1.2, 1.1]),
    ])
    .unwrap()
}

/// Deterministic synthetic universe with funds of different ages and styles.
fn synthetic_universe(funds: usize, months: usize) -> Universe {
    let records = (0..funds)
        .map(|f| {
            let age = months - (f * 3) % (months / 2);
            let monthly = (0..age)
                .map(|m| {
                    let drift = 0.002 * (f % 5) as f64;
                    let wave = ((m * (f + 1)) as f64 * 0.7).sin() * 0.01 * (1 + f % 3) as f64;
                    1.0 + drift + wave
                })
                .collect();
            FundRecord::new(format!("fund-{:02}", f), monthly)
        })
        .collect();
    Universe::build(records).unwrap()
}

#[test]
fn test_two_fund_ratio_and_weighted_choice() {
    let universe = two_funds();

    // 0.99 against the best 1.32 at the cell covering both months.
    assert!(eq(universe.ratios(0).value(FeatureKind::Return, 0, 1), 0.75));
    assert!(eq(universe.ratios(1).value(FeatureKind::Return, 0, 1), 1.0));
    assert!(eq(universe.fund(0).features.value(FeatureKind::Median, 0, 1), 1.0));

    let weights = feature_weights(&[(FeatureKind::Return, 1.0), (FeatureKind::Median, 2.0)]);
    let mut strategy = WeightedMultiFeature::new(1, weights, 0, 0).unwrap();
    let candidates = [0, 1];
    let ctx = SelectionContext::new(&universe, 0, &candidates);
    let picks = strategy.choose(&ctx);
    assert_eq!(picks.len(), 1);
    assert_eq!(picks[0].fund, 1);
}

#[test]
fn test_empty_eligible_months_are_excluded() {
    let universe = synthetic_universe(4, 12);
    let config = BacktestConfig::default();
    let engine = BacktestEngine::new(&universe, &config);

    let mut strategy = TopByFeature::new(2, FeatureKind::Return, Direction::Highest, 0, 100);
    let candidates = universe.active_at(3);
    let ctx = SelectionContext::new(&universe, 3, &candidates);
    assert!(ctx.eligible(strategy.min_history()).is_empty());
    assert!(strategy.choose(&ctx).is_empty());

    let result = engine.run(&mut strategy);
    assert_eq!(result.months_used, 0);
    assert_eq!(result.score, NOT_COMPUTABLE);
    assert!(!result.is_computable());
}

#[test]
fn test_min_history_limits_evaluated_months() {
    let universe = synthetic_universe(3, 10);
    let config = BacktestConfig::default();
    let engine = BacktestEngine::new(&universe, &config);

    let all = engine.outcomes(&mut EqualWeightAll::new(0));
    let seasoned = engine.outcomes(&mut EqualWeightAll::new(4));
    assert_eq!(all.len(), 9);
    // The oldest fund has ten months, so as-of months 7..=9 lack four months of history.
    assert_eq!(seasoned.len(), 6);
    assert!(seasoned.iter().all(|o| o.as_of <= 6));
}

#[test]
fn test_best_fund_in_hindsight_beats_random() {
    let universe = Universe::build(vec![
        FundRecord::new("winner", vec![1.03; 24]),
        FundRecord::new("flat", vec![1.0; 24]),
        FundRecord::new("loser", vec![0.98; 24]),
    ])
    .unwrap();
    let config = BacktestConfig::default();
    let sweep = StrategySweep::new(&universe, &config).with_seed(7);
    let results = sweep
        .run(&[
            StrategySpec::Random {
                num_funds: 1,
                min_history: 0,
            },
            StrategySpec::TopByFeature {
                num_funds: 1,
                feature: FeatureKind::Return,
                direction: Direction::Highest,
                lookback: 0,
                min_history: 0,
            },
        ])
        .unwrap();

    assert!(results[1].score >= results[0].score);
    assert!(eq(results[1].vs_optimum, 1.0));
}

#[test]
fn test_sweep_keeps_input_order_and_is_reproducible() {
    let universe = synthetic_universe(12, 36);
    let config = BacktestConfig::default();
    let grid = SweepGrid {
        fund_counts: IntRange::new(1, 3, 1),
        lookbacks: IntRange::new(0, 12, 6),
        min_histories: IntRange::new(0, 12, 6),
        features: FeatureKind::ALL.to_vec(),
        directions: vec![Direction::Highest, Direction::Lowest],
        include_random: true,
    };
    let specs = grid.generate();

    let sweep = StrategySweep::new(&universe, &config).with_seed(11);
    let first = sweep.run(&specs).unwrap();
    let second = sweep.run(&specs).unwrap();

    assert_eq!(first.len(), specs.len());
    for (spec, result) in specs.iter().zip(&first) {
        let name = spec
            .build(&fundsim::strategies::BuildContext::with_seed(0))
            .unwrap()
            .name()
            .to_string();
        assert_eq!(result.strategy_name, name);
    }
    let scores = |rs: &[fundsim::BacktestResult]| rs.iter().map(|r| r.score).collect::<Vec<_>>();
    assert_eq!(scores(&first), scores(&second));
}

#[test]
fn test_sweep_matches_sequential_runs() {
    let universe = synthetic_universe(8, 24);
    let config = BacktestConfig {
        aggregation: Aggregation::Mean,
        return_measure: ReturnMeasure::Simple,
        holding_months: 3,
        ..Default::default()
    };
    let specs = vec![
        StrategySpec::All { min_history: 6 },
        StrategySpec::Fixed {
            indices: vec![2, 5],
        },
        StrategySpec::TopByFeature {
            num_funds: 2,
            feature: FeatureKind::StdDev,
            direction: Direction::Lowest,
            lookback: 6,
            min_history: 6,
        },
    ];
    let results = StrategySweep::new(&universe, &config).run(&specs).unwrap();

    let engine = BacktestEngine::new(&universe, &config);
    assert_eq!(results[0].score, engine.score(&mut EqualWeightAll::new(6)));
    assert_eq!(results[1].score, engine.score(&mut FixedIndices::new(vec![2, 5])));
    assert_eq!(
        results[2].score,
        engine.score(&mut TopByFeature::new(
            2,
            FeatureKind::StdDev,
            Direction::Lowest,
            6,
            6
        ))
    );
}

#[test]
fn test_prediction_sweep() {
    let universe = two_funds();
    let mut table = PredictionTable::default();
    table.insert("first", 1, 0.2);
    table.insert("second", 1, 0.8);

    let config = BacktestConfig {
        return_measure: ReturnMeasure::Simple,
        ..Default::default()
    };
    let specs = [
        StrategySpec::Prediction { num_funds: 1 },
        StrategySpec::All { min_history: 0 },
    ];

    let without = StrategySweep::new(&universe, &config).run(&specs).unwrap();
    assert_eq!(without.len(), 1);

    let with = StrategySweep::new(&universe, &config)
        .with_predictions(Some(Arc::new(table)))
        .run(&specs)
        .unwrap();
    assert_eq!(with.len(), 2);
    assert!(eq(with[0].score, 1.2));
    assert!(eq(with[1].score, (0.9 + 1.2) / 2.0));
}

#[test]
fn test_load_and_backtest_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Alpha\t1.000,00\tD+1\tD+30\tSim\t1,0\t1,0\t1,0\t1,0").unwrap();
    writeln!(file, "Beta\t25.000,00\t0\t0\tSim\t2,0\t-1,0\t0,5").unwrap();
    writeln!(file, "Gamma\t100\t0\t0\tNão\t0,1").unwrap();

    let config = DataConfig {
        min_months: 2,
        ..Default::default()
    };
    let records = load_funds(file.path(), &config).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].redemption_delay(), 31);

    let universe = Universe::build(records).unwrap();
    assert_eq!(universe.max_duration(), 4);
    assert_eq!(universe.find("Beta"), Some(1));

    let backtest = BacktestConfig {
        return_measure: ReturnMeasure::Simple,
        ..Default::default()
    };
    let engine = BacktestEngine::new(&universe, &backtest);
    let outcomes = engine.outcomes(&mut FixedIndices::new(vec![0]));
    assert_eq!(outcomes.len(), 3);
    assert!(eq(outcomes[2].performance, 1.01));
    assert!(eq(outcomes[2].optimum, 1.02));
}

#[test]
fn test_missing_prediction_files_load_nothing() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.tsv");
    let loaded = load_predictions(Some(missing.as_path()), Some(missing.as_path())).unwrap();
    assert!(loaded.is_none());
    assert!(load_predictions(None, None).unwrap().is_none());
}

#[test]
fn test_run_from_config_file() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("funds.tsv");
    std::fs::write(
        &data,
        "A\t0\t0\t0\tSim\t1,0\t2,0\t-1,0\t0,5\t1,5\n\
         B\t0\t0\t0\tSim\t0,5\t0,5\t0,5\t0,5\t0,5\n\
         C\t0\t0\t0\tSim\t-2,0\t3,0\t1,0\n",
    )
    .unwrap();

    let config_path = dir.path().join("sweep.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[data]
path = "{}"

[backtest]
return_measure = "simple"
seed = 3

[sweep]
features = ["return", "stdDev"]
directions = ["highest"]
include_random = true

[sweep.fund_counts]
start = 1
end = 2

[sweep.lookbacks]
start = 0
end = 0

[sweep.min_histories]
start = 0
end = 2
step = 2

[[strategies]]
type = "all"
"#,
            data.display()
        ),
    )
    .unwrap();

    let file_config = SweepFileConfig::load(&config_path).unwrap();
    let records = load_funds(&file_config.data.path, &file_config.to_data_config()).unwrap();
    let universe = Universe::build(records).unwrap();
    let specs = file_config.strategy_specs().unwrap();
    // 1 listed + 2 fund counts * (1 random + 2 min histories * 1 direction * 2 features).
    assert_eq!(specs.len(), 1 + 2 * (1 + 2 * 2));

    let backtest = file_config.to_backtest_config();
    let results = StrategySweep::new(&universe, &backtest)
        .with_seed(file_config.backtest.seed)
        .run(&specs)
        .unwrap();
    assert_eq!(results.len(), specs.len());
    assert_eq!(results[0].strategy_name, "all(0)");
    assert!(results.iter().all(|r| r.is_computable()));
}

#[test]
fn test_config_file_runs_benchmark_optimizer_and_export() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("funds.tsv");
    let index = dir.path().join("cdi.tsv");
    std::fs::write(
        &data,
        "A\t0\t0\t0\tSim\t1,0\t2,0\t-1,0\t0,5\t1,5\t0,8\n\
         B\t0\t0\t0\tSim\t0,5\t0,5\t0,5\t0,5\t0,5\t0,5\n\
         C\t0\t0\t0\tSim\t-2,0\t3,0\t1,0\t0,2\n",
    )
    .unwrap();
    std::fs::write(&index, "0,5\n0,5\n0,5\n0,5\n0,5\n0,5\n").unwrap();

    let config_path = dir.path().join("sweep.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[data]
path = "{}"
index = "{}"

[optimizer]
num_funds = 2
lookback = 2
min_history = 2
rounds = 3
seed = 9

[[strategies]]
type = "all"

[[strategies]]
type = "fixed"
indices = [1]
"#,
            data.display(),
            index.display()
        ),
    )
    .unwrap();

    let run = SweepFileConfig::load(&config_path).unwrap().run(false).unwrap();
    assert_eq!(run.results.len(), 2);

    let benchmark = run.benchmark.as_ref().unwrap();
    assert_eq!(benchmark.index, "cdi");
    // Fund B earns exactly the benchmark, so the optimum can only do better.
    assert!(benchmark.optimum_ratio >= 1.0);

    let rounds = run.optimizer.as_ref().unwrap();
    assert_eq!(rounds.len(), 3);
    assert!(rounds.iter().all(|r| r.weights.len() == FeatureKind::COUNT));

    let exported = dir.path().join("results.json");
    export_results(&run.results, &exported).unwrap();
    let parsed: Vec<fundsim::BacktestResult> =
        serde_json::from_str(&std::fs::read_to_string(&exported).unwrap()).unwrap();
    assert_eq!(parsed, run.results);
}

#[test]
fn test_benchmark_comparison() {
    let universe = Universe::build(vec![
        FundRecord::new("a", vec![1.02, 1.02, 1.02]),
        FundRecord::new("b", vec![1.00, 1.00, 1.00]),
    ])
    .unwrap();
    let index = IndexSeries::new("cdi", vec![1.01, 1.01, 1.01]);
    let comparison = BenchmarkComparison::new(&universe, &index);

    assert!(eq(comparison.average_ratio_to_index(None).unwrap(), 1.01 / 1.01));
    assert!(eq(comparison.optimum_ratio_to_index(None).unwrap(), 1.02 / 1.01));

    let short = IndexSeries::new("short", vec![1.01]);
    assert!(BenchmarkComparison::new(&universe, &short)
        .average_ratio_to_index(None)
        .is_err());
}

#[test]
fn test_optimizer_never_gets_worse() {
    let universe = synthetic_universe(6, 24);
    let backtest = BacktestConfig::default();
    let config = OptimizerConfig {
        num_funds: 2,
        lookback: 6,
        min_history: 6,
        rounds: 4,
        seed: 5,
        ..Default::default()
    };
    let mut optimizer = WeightOptimizer::new(&universe, &backtest, config).unwrap();

    let mut rounds = Vec::new();
    optimizer
        .run_with(vec![0.0; FeatureKind::COUNT], |round| rounds.push(round.score))
        .unwrap();
    assert_eq!(rounds.len(), 4);
    assert!(rounds.windows(2).all(|w| w[1] >= w[0]));
}
