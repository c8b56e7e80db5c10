//! Replay of externally computed scores.
//!
//! A metadata file of `(fund name, month)` keys and a predictions file of
//! scores are paired line by line into a [`PredictionTable`]. The strategy
//! then ranks funds by the score recorded for them at the as-of month.

use crate::error::{FundError, Result};
use crate::strategy::{rank_descending, SelectionContext, SelectionStrategy};
use crate::types::Pick;
use std::collections::HashMap;
use std::sync::Arc;

/// Scores keyed by fund name and month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionTable {
    scores: HashMap<String, HashMap<usize, f64>>,
}

impl PredictionTable {
    /// Pair metadata keys with scores positionally.
    ///
    /// Fails when the two sequences have different lengths. A repeated key
    /// keeps the last score.
    pub fn from_pairs(keys: Vec<(String, usize)>, scores: Vec<f64>) -> Result<Self> {
        if keys.len() != scores.len() {
            return Err(FundError::InvalidInput(format!(
                "{} metadata rows but {} predictions",
                keys.len(),
                scores.len()
            )));
        }
        let mut table = Self::default();
        for ((name, month), score) in keys.into_iter().zip(scores) {
            table.insert(name, month, score);
        }
        Ok(table)
    }

    pub fn insert(&mut self, name: impl Into<String>, month: usize, score: f64) {
        self.scores.entry(name.into()).or_default().insert(month, score);
    }

    /// Score of a fund at a month, if one was predicted.
    pub fn get(&self, name: &str, month: usize) -> Option<f64> {
        self.scores.get(name).and_then(|m| m.get(&month)).copied()
    }

    /// Number of `(fund, month)` entries.
    pub fn len(&self) -> usize {
        self.scores.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Top-N funds by predicted score. Funds without a score are ineligible.
#[derive(Debug, Clone)]
pub struct PredictionReplay {
    num_funds: usize,
    table: Arc<PredictionTable>,
    name: String,
}

impl PredictionReplay {
    pub fn new(num_funds: usize, table: Arc<PredictionTable>) -> Self {
        Self {
            num_funds,
            table,
            name: format!("prediction({})", num_funds),
        }
    }
}

impl SelectionStrategy for PredictionReplay {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &SelectionContext) -> Vec<Pick> {
        let mut scored: Vec<(usize, f64)> = ctx
            .eligible(0)
            .into_iter()
            .filter_map(|i| {
                self.table
                    .get(ctx.fund(i).name(), ctx.as_of)
                    .map(|score| (i, score))
            })
            .collect();
        rank_descending(&mut scored);
        scored
            .into_iter()
            .take(self.num_funds)
            .map(|(i, _)| Pick::equal(i))
            .collect()
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("num_funds".to_string(), self.num_funds.to_string()),
            ("predictions".to_string(), self.table.len().to_string()),
        ]
    }
}
