//! Serializable strategy descriptions.
//!
//! A [`StrategySpec`] is plain data that can live in a TOML or JSON file. The
//! sweep turns each one into a fresh boxed strategy per task, so no strategy
//! object is ever shared between threads.

use super::{
    BudgetGreedy, EqualWeightAll, FixedIndices, PredictionReplay, PredictionTable, RandomPick,
    TopByFeature, WeightedMultiFeature,
};
use crate::error::{FundError, Result};
use crate::strategy::SelectionStrategy;
use crate::types::{Direction, FeatureKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Any selection strategy, described by its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    Random {
        num_funds: usize,
        #[serde(default)]
        min_history: usize,
    },
    TopByFeature {
        num_funds: usize,
        feature: FeatureKind,
        #[serde(default)]
        direction: Direction,
        #[serde(default)]
        lookback: usize,
        #[serde(default)]
        min_history: usize,
    },
    Weighted {
        num_funds: usize,
        weights: Vec<f64>,
        #[serde(default)]
        lookback: usize,
        #[serde(default)]
        min_history: usize,
    },
    Fixed {
        indices: Vec<usize>,
    },
    BudgetGreedy {
        budget: f64,
        #[serde(default)]
        min_history: usize,
    },
    All {
        #[serde(default)]
        min_history: usize,
    },
    Prediction {
        num_funds: usize,
    },
}

/// Inputs a strategy may need besides its own parameters.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    /// Seed for strategies that draw random numbers.
    pub seed: u64,
    /// Scores for [`StrategySpec::Prediction`], when the files were provided.
    pub predictions: Option<Arc<PredictionTable>>,
}

impl BuildContext {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            predictions: None,
        }
    }
}

impl StrategySpec {
    /// Instantiate the strategy.
    ///
    /// Fails on an invalid weight vector, or on a prediction strategy when no
    /// prediction table is available.
    pub fn build(&self, ctx: &BuildContext) -> Result<Box<dyn SelectionStrategy>> {
        let strategy: Box<dyn SelectionStrategy> = match self {
            StrategySpec::Random {
                num_funds,
                min_history,
            } => Box::new(RandomPick::new(*num_funds, *min_history, ctx.seed)),
            StrategySpec::TopByFeature {
                num_funds,
                feature,
                direction,
                lookback,
                min_history,
            } => Box::new(TopByFeature::new(
                *num_funds,
                *feature,
                *direction,
                *lookback,
                *min_history,
            )),
            StrategySpec::Weighted {
                num_funds,
                weights,
                lookback,
                min_history,
            } => Box::new(WeightedMultiFeature::new(
                *num_funds,
                weights.clone(),
                *lookback,
                *min_history,
            )?),
            StrategySpec::Fixed { indices } => Box::new(FixedIndices::new(indices.clone())),
            StrategySpec::BudgetGreedy {
                budget,
                min_history,
            } => Box::new(BudgetGreedy::new(*budget, *min_history)),
            StrategySpec::All { min_history } => Box::new(EqualWeightAll::new(*min_history)),
            StrategySpec::Prediction { num_funds } => {
                let table = ctx.predictions.clone().ok_or_else(|| {
                    FundError::ConfigError(
                        "prediction strategy requires metadata and predictions files".to_string(),
                    )
                })?;
                Box::new(PredictionReplay::new(*num_funds, table))
            }
        };
        Ok(strategy)
    }

    /// Whether building needs a prediction table.
    pub fn needs_predictions(&self) -> bool {
        matches!(self, StrategySpec::Prediction { .. })
    }

    /// Short label of the variant, as used in configuration files.
    pub fn kind(&self) -> &'static str {
        match self {
            StrategySpec::Random { .. } => "random",
            StrategySpec::TopByFeature { .. } => "top_by_feature",
            StrategySpec::Weighted { .. } => "weighted",
            StrategySpec::Fixed { .. } => "fixed",
            StrategySpec::BudgetGreedy { .. } => "budget_greedy",
            StrategySpec::All { .. } => "all",
            StrategySpec::Prediction { .. } => "prediction",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_each_variant() {
        let specs = vec![
            StrategySpec::Random {
                num_funds: 2,
                min_history: 0,
            },
            StrategySpec::TopByFeature {
                num_funds: 2,
                feature: FeatureKind::Median,
                direction: Direction::Highest,
                lookback: 6,
                min_history: 6,
            },
            StrategySpec::Weighted {
                num_funds: 1,
                weights: vec![1.0, 2.0, 0.0, 0.0, 0.0, 0.0],
                lookback: 0,
                min_history: 0,
            },
            StrategySpec::Fixed { indices: vec![0] },
            StrategySpec::BudgetGreedy {
                budget: 1000.0,
                min_history: 0,
            },
            StrategySpec::All { min_history: 0 },
        ];
        let ctx = BuildContext::with_seed(1);
        for spec in &specs {
            assert!(spec.build(&ctx).is_ok(), "failed to build {}", spec.kind());
        }
        let top = specs[1].build(&ctx).unwrap();
        assert_eq!(top.name(), "highest-median(2,6,6)");
        assert_eq!(top.min_history(), 6);
    }

    #[test]
    fn test_prediction_needs_table() {
        let spec = StrategySpec::Prediction { num_funds: 3 };
        assert!(spec.needs_predictions());
        assert!(matches!(
            spec.build(&BuildContext::default()),
            Err(FundError::ConfigError(_))
        ));
        let ctx = BuildContext {
            seed: 0,
            predictions: Some(Arc::new(PredictionTable::default())),
        };
        assert!(spec.build(&ctx).is_ok());
    }

    #[test]
    fn test_invalid_weights_fail_to_build() {
        let spec = StrategySpec::Weighted {
            num_funds: 2,
            weights: vec![1.0; 4],
            lookback: 0,
            min_history: 0,
        };
        assert!(spec.build(&BuildContext::default()).is_err());
    }

    #[test]
    fn test_spec_from_toml() {
        let spec: StrategySpec = toml::from_str(
            r#"
            type = "top_by_feature"
            num_funds = 3
            feature = "greatestFall"
            direction = "lowest"
            lookback = 12
            "#,
        )
        .unwrap();
        assert_eq!(
            spec,
            StrategySpec::TopByFeature {
                num_funds: 3,
                feature: FeatureKind::GreatestFall,
                direction: Direction::Lowest,
                lookback: 12,
                min_history: 0,
            }
        );
    }

    #[test]
    fn test_spec_json_round_trip() {
        let spec = StrategySpec::All { min_history: 4 };
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"type":"all","min_history":4}"#);
        let back: StrategySpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
