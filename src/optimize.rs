//! Hill-climbing search over weighted-strategy weights.
//!
//! Starting from a weight vector, each round proposes a move up and a move
//! down for every coordinate, evaluates all proposals in parallel and keeps
//! the best one if it improves the score. Rounds without improvement halve
//! the step size. Weights stay inside `[-1, 1]`.

use crate::engine::{BacktestConfig, BacktestEngine};
use crate::error::{FundError, Result};
use crate::strategies::WeightedMultiFeature;
use crate::types::FeatureKind;
use crate::universe::Universe;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub num_funds: usize,
    pub lookback: usize,
    pub min_history: usize,
    /// Use one weight vector per picked fund instead of a shared one.
    pub per_slot: bool,
    pub rounds: usize,
    /// Largest move of a coordinate in the first round.
    pub initial_step: f64,
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            num_funds: 1,
            lookback: 3,
            min_history: 6,
            per_slot: false,
            rounds: 20,
            initial_step: 1.0,
            seed: 0,
        }
    }
}

impl OptimizerConfig {
    /// Length of the weight vector being searched.
    pub fn dimension(&self) -> usize {
        if self.per_slot {
            self.num_funds * FeatureKind::COUNT
        } else {
            FeatureKind::COUNT
        }
    }
}

/// State after one round of the search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizerRound {
    pub round: usize,
    pub score: f64,
    pub elapsed_ms: u64,
    pub weights: Vec<f64>,
    pub step: f64,
}

impl OptimizerRound {
    /// `round \t score \t elapsed \t weights \t step`.
    pub fn to_tsv_line(&self) -> String {
        format!(
            "{}\t{}\t{}ms\t{:?}\t{}",
            self.round, self.score, self.elapsed_ms, self.weights, self.step
        )
    }
}

/// Stochastic coordinate hill-climbing for [`WeightedMultiFeature`].
pub struct WeightOptimizer<'a> {
    universe: &'a Universe,
    backtest: &'a BacktestConfig,
    config: OptimizerConfig,
    rng: StdRng,
}

impl<'a> WeightOptimizer<'a> {
    pub fn new(
        universe: &'a Universe,
        backtest: &'a BacktestConfig,
        config: OptimizerConfig,
    ) -> Result<Self> {
        if config.num_funds == 0 {
            return Err(FundError::ConfigError(
                "optimizer needs at least one fund".to_string(),
            ));
        }
        if config.initial_step.is_nan() || config.initial_step <= 0.0 {
            return Err(FundError::ConfigError(
                "optimizer step must be positive".to_string(),
            ));
        }
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            universe,
            backtest,
            config,
            rng,
        })
    }

    /// Backtest score of a weight vector.
    pub fn evaluate(&self, weights: &[f64]) -> Result<f64> {
        let mut strategy = WeightedMultiFeature::new(
            self.config.num_funds,
            weights.to_vec(),
            self.config.lookback,
            self.config.min_history,
        )?;
        Ok(BacktestEngine::new(self.universe, self.backtest).score(&mut strategy))
    }

    /// Run the search from the all-zero vector.
    pub fn run(&mut self) -> Result<Vec<OptimizerRound>> {
        let start = vec![0.0; self.config.dimension()];
        self.run_from(start)
    }

    /// Run the search from the given weights, calling back after every round.
    pub fn run_with<F>(&mut self, start: Vec<f64>, mut on_round: F) -> Result<Vec<OptimizerRound>>
    where
        F: FnMut(&OptimizerRound),
    {
        if start.len() != self.config.dimension() {
            return Err(FundError::InvalidInput(format!(
                "start vector has {} weights, expected {}",
                start.len(),
                self.config.dimension()
            )));
        }

        let mut weights: Vec<f64> = start.into_iter().map(|w| w.clamp(-1.0, 1.0)).collect();
        let mut score = self.evaluate(&weights)?;
        let mut step = self.config.initial_step;
        let mut rounds = Vec::with_capacity(self.config.rounds);
        info!("Optimizing {} weights, initial score {:.6}", weights.len(), score);

        for round in 0..self.config.rounds {
            let started = Instant::now();
            let candidates = self.propose(&weights, step);

            let scored: Vec<Result<f64>> = candidates
                .par_iter()
                .map(|candidate| self.evaluate(candidate))
                .collect();

            let mut best: Option<(usize, f64)> = None;
            for (i, result) in scored.into_iter().enumerate() {
                let value = result?;
                if value > best.map_or(score, |(_, s)| s) {
                    best = Some((i, value));
                }
            }

            match best {
                Some((i, value)) => {
                    weights = candidates[i].clone();
                    score = value;
                }
                None => {
                    step /= 2.0;
                    debug!("Round {} found no improvement, step now {}", round, step);
                }
            }

            let summary = OptimizerRound {
                round,
                score,
                elapsed_ms: started.elapsed().as_millis() as u64,
                weights: weights.clone(),
                step,
            };
            on_round(&summary);
            rounds.push(summary);
        }
        Ok(rounds)
    }

    /// Run the search from the given weights.
    pub fn run_from(&mut self, start: Vec<f64>) -> Result<Vec<OptimizerRound>> {
        self.run_with(start, |_| {})
    }

    /// One move down and one move up per coordinate, kept inside `[-1, 1]`.
    fn propose(&mut self, weights: &[f64], step: f64) -> Vec<Vec<f64>> {
        let mut candidates = Vec::with_capacity(weights.len() * 2);
        for i in 0..weights.len() {
            for sign in [-1.0, 1.0] {
                let delta: f64 = self.rng.gen_range(0.0..=step);
                let moved = weights[i] + sign * delta;
                if (-1.0..=1.0).contains(&moved) && moved != weights[i] {
                    let mut candidate = weights.to_vec();
                    candidate[i] = moved;
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }
}
