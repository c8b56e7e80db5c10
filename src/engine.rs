//! Backtest execution engine.
//!
//! A backtest replays a strategy over every historical as-of month, measures
//! what the chosen funds returned afterwards and aggregates those realized
//! returns into one score.

use crate::analytics::{Aggregation, ReturnMeasure};
use crate::strategy::{SelectionContext, SelectionStrategy};
use crate::types::Pick;
use crate::universe::Universe;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, trace};

/// Configuration for the backtest engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// How per-month performances are combined into a score.
    pub aggregation: Aggregation,
    /// Whether realized returns are annualized.
    pub return_measure: ReturnMeasure,
    /// Months of realized future to measure; 0 measures up to the present.
    pub holding_months: usize,
    /// An as-of month needs more than this many active funds.
    pub min_funds_threshold: usize,
    /// Oldest as-of month to evaluate (None = the oldest with a future).
    pub max_as_of: Option<usize>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::Median,
            return_measure: ReturnMeasure::Annualized,
            holding_months: 0,
            min_funds_threshold: 0,
            max_as_of: None,
        }
    }
}

/// Results from a backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Strategy name.
    pub strategy_name: String,
    /// Aggregate realized performance, or -1 when no month produced a value.
    pub score: f64,
    /// Number of as-of months that contributed.
    pub months_used: usize,
    /// Aggregate ratio of realized performance to the optimum fund's.
    pub vs_optimum: f64,
    /// Wall-clock duration of the run.
    pub elapsed_ms: u64,
}

impl BacktestResult {
    /// Whether at least one month produced a value.
    pub fn is_computable(&self) -> bool {
        self.months_used > 0
    }
}

/// Realized outcome of one as-of month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthOutcome {
    /// The as-of month.
    pub as_of: usize,
    /// Realized performance of the picks.
    pub performance: f64,
    /// Realized performance of the optimum fund over the same months.
    pub optimum: f64,
}

/// Runs strategies against a shared universe.
#[derive(Debug, Clone, Copy)]
pub struct BacktestEngine<'a> {
    universe: &'a Universe,
    config: &'a BacktestConfig,
}

impl<'a> BacktestEngine<'a> {
    pub fn new(universe: &'a Universe, config: &'a BacktestConfig) -> Self {
        Self { universe, config }
    }

    pub fn config(&self) -> &BacktestConfig {
        self.config
    }

    /// Run a backtest and summarize it.
    pub fn run(&self, strategy: &mut dyn SelectionStrategy) -> BacktestResult {
        let started = Instant::now();
        debug!("Running backtest: {}", strategy.name());

        let outcomes = self.outcomes(strategy);
        let performances: Vec<f64> = outcomes.iter().map(|o| o.performance).collect();
        let ratios: Vec<f64> = outcomes
            .iter()
            .filter(|o| o.optimum > 0.0)
            .map(|o| o.performance / o.optimum)
            .collect();

        let score = self.config.aggregation.apply(&performances);
        let vs_optimum = self.config.aggregation.apply(&ratios);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        debug!(
            "Backtest {} done: score {:.6} over {} months in {}ms",
            strategy.name(),
            score,
            outcomes.len(),
            elapsed_ms
        );

        BacktestResult {
            strategy_name: strategy.name().to_string(),
            score,
            months_used: outcomes.len(),
            vs_optimum,
            elapsed_ms,
        }
    }

    /// Aggregate score only; -1 when not computable.
    pub fn score(&self, strategy: &mut dyn SelectionStrategy) -> f64 {
        let performances: Vec<f64> = self
            .outcomes(strategy)
            .iter()
            .map(|o| o.performance)
            .collect();
        self.config.aggregation.apply(&performances)
    }

    /// Realized outcome of every as-of month the strategy could be evaluated in,
    /// oldest month first.
    ///
    /// A month is skipped when it has too few active funds, when no active
    /// fund has the history the strategy requires, or when the strategy
    /// chooses nothing.
    pub fn outcomes(&self, strategy: &mut dyn SelectionStrategy) -> Vec<MonthOutcome> {
        let universe = self.universe;
        let Some(oldest) = self.oldest_as_of() else {
            return Vec::new();
        };

        let mut outcomes = Vec::new();
        for t in (1..=oldest).rev() {
            let active = universe.active_at(t);
            if active.len() <= self.config.min_funds_threshold {
                trace!("Skipping month {}: {} active funds", t, active.len());
                continue;
            }
            let ctx = SelectionContext::new(universe, t, &active);
            if ctx.eligible(strategy.min_history()).is_empty() {
                trace!("Skipping month {}: no fund with enough history", t);
                continue;
            }

            let picks = strategy.choose(&ctx);
            let (end, span) = self.holding_cell(t);
            let Some(multiplier) = self.realized(&picks, t, end, span) else {
                trace!("Skipping month {}: empty choice", t);
                continue;
            };

            let months = span + 1;
            let measure = self.config.return_measure;
            outcomes.push(MonthOutcome {
                as_of: t,
                performance: measure.measure(multiplier, months),
                optimum: measure.measure(universe.optimum().value_at(end, span), months),
            });
        }
        outcomes
    }

    fn oldest_as_of(&self) -> Option<usize> {
        let latest = self.universe.max_duration().checked_sub(1)?;
        let oldest = self.config.max_as_of.map_or(latest, |m| m.min(latest));
        (oldest >= 1).then_some(oldest)
    }

    /// Cell of the realized future after `t`: months `t-1` down to `end`.
    fn holding_cell(&self, t: usize) -> (usize, usize) {
        let end = match self.config.holding_months {
            0 => 0,
            h => t.saturating_sub(h),
        };
        (end, t - 1 - end)
    }

    /// Allocation-weighted mean multiplier of the picks over `(end, span)`.
    ///
    /// Picks of funds without a return at `t` are ignored. All-zero weights
    /// fall back to equal weighting.
    fn realized(&self, picks: &[Pick], t: usize, end: usize, span: usize) -> Option<f64> {
        let values: Vec<(f64, f64)> = picks
            .iter()
            .filter(|p| self.universe.fund(p.fund).covers(t))
            .map(|p| {
                let value = self.universe.fund(p.fund).features.returns().value_at(end, span);
                (p.weight, value)
            })
            .collect();
        if values.is_empty() {
            return None;
        }

        let total: f64 = values.iter().map(|(w, _)| w).sum();
        if total > 0.0 {
            Some(values.iter().map(|(w, v)| w * v).sum::<f64>() / total)
        } else {
            Some(values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64)
        }
    }
}
