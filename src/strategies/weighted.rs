//! Weighted combination of ratio-to-best features.
//!
//! Each eligible fund is scored by the dot product of its ratio tables with a
//! weight vector, at the cell covering its look-back window. Funds are picked
//! greedily one slot at a time. With a per-slot vector every slot scores the
//! remaining funds with its own weights.

use crate::error::{FundError, Result};
use crate::strategy::{SelectionContext, SelectionStrategy};
use crate::types::{FeatureKind, Pick};

/// How the weight vector is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightMode {
    /// One vector of `FeatureKind::COUNT` weights shared by every slot.
    Shared,
    /// `num_funds` consecutive vectors, one per slot.
    PerSlot,
}

/// Greedy multi-feature selection over ratio tables.
#[derive(Debug, Clone)]
pub struct WeightedMultiFeature {
    num_funds: usize,
    weights: Vec<f64>,
    mode: WeightMode,
    lookback: usize,
    min_history: usize,
    name: String,
}

impl WeightedMultiFeature {
    /// Create the strategy.
    ///
    /// `weights` must hold either `FeatureKind::COUNT` values (shared mode) or
    /// `num_funds * FeatureKind::COUNT` values (per-slot mode).
    pub fn new(
        num_funds: usize,
        weights: Vec<f64>,
        lookback: usize,
        min_history: usize,
    ) -> Result<Self> {
        let count = FeatureKind::COUNT;
        let mode = if weights.len() == count {
            WeightMode::Shared
        } else if num_funds > 0 && weights.len() == num_funds * count {
            WeightMode::PerSlot
        } else {
            return Err(FundError::InvalidInput(format!(
                "weight vector has {} values, expected {} or {}",
                weights.len(),
                count,
                num_funds * count
            )));
        };
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(FundError::InvalidInput(
                "weights must be finite numbers".to_string(),
            ));
        }

        let formatted: Vec<String> = weights.iter().map(|w| format!("{}", w)).collect();
        let name = format!(
            "weighted({},{},{},[{}])",
            num_funds,
            lookback,
            min_history,
            formatted.join(" ")
        );
        Ok(Self {
            num_funds,
            weights,
            mode,
            lookback,
            min_history,
            name,
        })
    }

    pub fn mode(&self) -> WeightMode {
        self.mode
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn slot_weights(&self, slot: usize) -> &[f64] {
        match self.mode {
            WeightMode::Shared => &self.weights,
            WeightMode::PerSlot => {
                let count = FeatureKind::COUNT;
                &self.weights[slot * count..(slot + 1) * count]
            }
        }
    }
}

/// Expand `(feature, weight)` pairs into a shared weight vector.
///
/// Features not listed get weight 0.
pub fn feature_weights(pairs: &[(FeatureKind, f64)]) -> Vec<f64> {
    let mut weights = vec![0.0; FeatureKind::COUNT];
    for &(kind, weight) in pairs {
        weights[kind.index()] = weight;
    }
    weights
}

impl SelectionStrategy for WeightedMultiFeature {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &SelectionContext) -> Vec<Pick> {
        let mut remaining: Vec<(usize, usize)> = ctx
            .eligible(self.min_history)
            .into_iter()
            .map(|i| (i, ctx.window_span(i, self.lookback)))
            .collect();
        let mut picks = Vec::with_capacity(self.num_funds.min(remaining.len()));

        for slot in 0..self.num_funds {
            let weights = self.slot_weights(slot);
            let mut best: Option<(usize, f64)> = None;
            for (pos, &(fund, span)) in remaining.iter().enumerate() {
                let score = ctx.universe.ratios(fund).weighted(weights, ctx.as_of, span);
                // Strict comparison keeps the first of equal scores.
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((pos, score));
                }
            }
            match best {
                Some((pos, _)) => {
                    let (fund, _) = remaining.remove(pos);
                    picks.push(Pick::equal(fund));
                }
                None => break,
            }
        }
        picks
    }

    fn min_history(&self) -> usize {
        self.min_history
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("num_funds".to_string(), self.num_funds.to_string()),
            ("lookback".to_string(), self.lookback.to_string()),
            ("min_history".to_string(), self.min_history.to_string()),
            ("weights".to_string(), format!("{:?}", self.weights)),
        ]
    }
}
