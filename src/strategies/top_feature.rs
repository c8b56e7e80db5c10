//! Single-feature ranking.
//!
//! Ranks eligible funds by one feature over a look-back window and keeps the
//! best (or, with [`Direction::Lowest`], the worst) `num_funds`.

use crate::analytics::annualize;
use crate::strategy::{rank_descending, SelectionContext, SelectionStrategy};
use crate::types::{Direction, FeatureKind, Pick};

/// Top-N funds by a single feature.
///
/// # Parameters
/// - `num_funds`: how many funds to pick
/// - `feature`: the feature to rank by
/// - `direction`: highest or lowest values first
/// - `lookback`: window length in months ending at the as-of month (0 = whole history)
/// - `min_history`: months of history a fund needs at the as-of month
///
/// Returns are annualized before ranking so funds whose windows were clamped
/// to a shorter history compare on the same scale. Ties keep universe order.
#[derive(Debug, Clone)]
pub struct TopByFeature {
    num_funds: usize,
    feature: FeatureKind,
    direction: Direction,
    lookback: usize,
    min_history: usize,
    name: String,
}

impl TopByFeature {
    pub fn new(
        num_funds: usize,
        feature: FeatureKind,
        direction: Direction,
        lookback: usize,
        min_history: usize,
    ) -> Self {
        Self {
            num_funds,
            feature,
            direction,
            lookback,
            min_history,
            name: format!(
                "{}-{}({},{},{})",
                direction, feature, num_funds, lookback, min_history
            ),
        }
    }

    /// Best trailing return over the whole history.
    pub fn best_return(num_funds: usize) -> Self {
        Self::new(num_funds, FeatureKind::Return, Direction::Highest, 0, 0)
    }

    fn score(&self, ctx: &SelectionContext, fund: usize) -> f64 {
        let span = ctx.window_span(fund, self.lookback);
        let value = ctx.fund(fund).features.value(self.feature, ctx.as_of, span);
        let value = if self.feature == FeatureKind::Return {
            annualize(value, span + 1)
        } else {
            value
        };
        match self.direction {
            Direction::Highest => value,
            Direction::Lowest => -value,
        }
    }
}

impl SelectionStrategy for TopByFeature {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &SelectionContext) -> Vec<Pick> {
        let mut scored: Vec<(usize, f64)> = ctx
            .eligible(self.min_history)
            .into_iter()
            .map(|i| (i, self.score(ctx, i)))
            .collect();
        rank_descending(&mut scored);
        scored
            .into_iter()
            .take(self.num_funds)
            .map(|(i, _)| Pick::equal(i))
            .collect()
    }

    fn min_history(&self) -> usize {
        self.min_history
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("num_funds".to_string(), self.num_funds.to_string()),
            ("feature".to_string(), self.feature.to_string()),
            ("direction".to_string(), self.direction.to_string()),
            ("lookback".to_string(), self.lookback.to_string()),
            ("min_history".to_string(), self.min_history.to_string()),
        ]
    }
}
