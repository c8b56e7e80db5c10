//! Concurrent evaluation of many strategy configurations.
//!
//! Every configuration becomes its own strategy instance before the parallel
//! phase starts. Tasks then only read the shared [`Universe`], and results are
//! collected in input order whatever order the tasks finish in.

use crate::engine::{BacktestConfig, BacktestEngine, BacktestResult};
use crate::error::{FundError, Result};
use crate::strategies::{BuildContext, PredictionTable, StrategySpec};
use crate::strategy::SelectionStrategy;
use crate::types::{Direction, FeatureKind};
use crate::universe::Universe;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Runs a backtest per strategy configuration in parallel.
pub struct StrategySweep<'a> {
    universe: &'a Universe,
    config: &'a BacktestConfig,
    base_seed: u64,
    predictions: Option<Arc<PredictionTable>>,
    show_progress: bool,
}

impl<'a> StrategySweep<'a> {
    pub fn new(universe: &'a Universe, config: &'a BacktestConfig) -> Self {
        Self {
            universe,
            config,
            base_seed: 0,
            predictions: None,
            show_progress: false,
        }
    }

    /// Seed of the first task; task `i` uses `seed + i`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    pub fn with_predictions(mut self, predictions: Option<Arc<PredictionTable>>) -> Self {
        self.predictions = predictions;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Build and evaluate every configuration.
    ///
    /// Prediction strategies are dropped when no prediction table is loaded.
    /// Any other configuration that fails to build aborts the sweep before
    /// evaluation starts.
    pub fn run(&self, specs: &[StrategySpec]) -> Result<Vec<BacktestResult>> {
        let mut strategies = Vec::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            if spec.needs_predictions() && self.predictions.is_none() {
                info!("Skipping {} strategy: no predictions loaded", spec.kind());
                continue;
            }
            let ctx = BuildContext {
                seed: self.base_seed.wrapping_add(index as u64),
                predictions: self.predictions.clone(),
            };
            strategies.push(spec.build(&ctx)?);
        }
        Ok(self.run_strategies(strategies))
    }

    /// Evaluate already built strategies, one task each.
    pub fn run_strategies(
        &self,
        strategies: Vec<Box<dyn SelectionStrategy>>,
    ) -> Vec<BacktestResult> {
        info!("Sweeping {} strategies", strategies.len());
        let progress = self.progress_bar(strategies.len());
        let engine = BacktestEngine::new(self.universe, self.config);

        let results: Vec<BacktestResult> = strategies
            .into_par_iter()
            .map(|mut strategy| {
                let result = engine.run(strategy.as_mut());
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                result
            })
            .collect();

        if let Some(pb) = progress {
            pb.finish_with_message("done");
        }
        results
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}

/// Inclusive integer range with a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub start: usize,
    pub end: usize,
    #[serde(default = "default_step")]
    pub step: usize,
}

fn default_step() -> usize {
    1
}

impl IntRange {
    pub fn new(start: usize, end: usize, step: usize) -> Self {
        Self { start, end, step }
    }

    /// A range holding one value.
    pub fn single(value: usize) -> Self {
        Self::new(value, value, 1)
    }

    /// The values of the range; a zero step yields only `start`.
    pub fn values(&self) -> Vec<usize> {
        if self.step == 0 {
            return vec![self.start];
        }
        (self.start..=self.end).step_by(self.step).collect()
    }
}

/// Cross-product of single-feature strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepGrid {
    /// Numbers of funds to pick.
    pub fund_counts: IntRange,
    /// Look-back windows in months (0 = whole history).
    pub lookbacks: IntRange,
    /// Minimum history requirements; values below the look-back are skipped.
    pub min_histories: IntRange,
    /// Features to rank by.
    pub features: Vec<FeatureKind>,
    /// Ranking directions.
    pub directions: Vec<Direction>,
    /// Add one random baseline per fund count.
    pub include_random: bool,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            fund_counts: IntRange::single(10),
            lookbacks: IntRange::new(0, 60, 1),
            min_histories: IntRange::new(0, 60, 1),
            features: FeatureKind::ALL.to_vec(),
            directions: vec![Direction::Highest, Direction::Lowest],
            include_random: true,
        }
    }
}

impl SweepGrid {
    /// Enumerate the grid in a fixed order.
    pub fn generate(&self) -> Vec<StrategySpec> {
        let lookbacks = self.lookbacks.values();
        let min_histories = self.min_histories.values();
        let mut specs = Vec::new();

        for num_funds in self.fund_counts.values() {
            if self.include_random {
                specs.push(StrategySpec::Random {
                    num_funds,
                    min_history: 0,
                });
            }
            for &lookback in &lookbacks {
                for &min_history in min_histories.iter().filter(|&&m| m >= lookback) {
                    for &direction in &self.directions {
                        for &feature in &self.features {
                            specs.push(StrategySpec::TopByFeature {
                                num_funds,
                                feature,
                                direction,
                                lookback,
                                min_history,
                            });
                        }
                    }
                }
            }
        }
        specs
    }

    /// Reject grids that cannot produce any strategy.
    pub fn validate(&self) -> Result<()> {
        if self.fund_counts.values().iter().any(|&n| n == 0) {
            return Err(FundError::ConfigError(
                "fund counts must be positive".to_string(),
            ));
        }
        if self.features.is_empty() || self.directions.is_empty() {
            return Err(FundError::ConfigError(
                "sweep needs at least one feature and one direction".to_string(),
            ));
        }
        Ok(())
    }
}
