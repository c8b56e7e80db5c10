//! Fund selection strategies.
//!
//! Baselines:
//!
//! - [`RandomPick`]: uniformly random eligible funds, seeded per instance
//! - [`FixedIndices`]: a fixed list of funds for manual comparison
//! - [`EqualWeightAll`]: every eligible fund
//!
//! Feature-driven:
//! - [`TopByFeature`]: best (or worst) funds by a single feature
//! - [`WeightedMultiFeature`]: greedy picks by a weighted sum of ratio-to-best features
//! - [`BudgetGreedy`]: best returns first, one minimum investment each, within a budget
//!
//! External scores:
//! - [`PredictionReplay`]: ranks funds by precomputed predictions
//!
//! [`StrategySpec`] describes any of them as serializable data.

mod budget;
mod fixed;
mod params;
mod prediction;
mod random;
mod top_feature;
mod weighted;

pub use budget::BudgetGreedy;
pub use fixed::{EqualWeightAll, FixedIndices};
pub use params::{BuildContext, StrategySpec};
pub use prediction::{PredictionReplay, PredictionTable};
pub use random::RandomPick;
pub use top_feature::TopByFeature;
pub use weighted::{feature_weights, WeightMode, WeightedMultiFeature};
