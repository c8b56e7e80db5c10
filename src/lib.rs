//! Fundsim - backtests of investment fund selection strategies.
//!
//! # Overview
//!
//! Fundsim loads a snapshot of monthly fund returns and answers one question:
//! had a selection rule been applied every month in the past, how well would
//! the funds it picked have done afterwards?
//!
//! - **Period tables**: compounded return and five more statistics for every
//!   contiguous window of every fund, built once
//! - **Ratio-to-best normalization**: features comparable across scales and windows
//! - **Optimum fund**: the best attainable return per window, as a ceiling
//! - **Strategies**: random, single-feature, weighted multi-feature, fixed,
//!   budget-constrained and prediction replay
//! - **Parallel sweeps**: thousands of configurations evaluated concurrently
//!   with results in input order
//! - **Configuration files**: TOML-based configuration for reproducible sweeps
//!
//! Every per-fund sequence is indexed "months ago": month 0 is the most
//! recent month of the snapshot. As of month `t`, months `t` and older are
//! history and months below `t` are the realized future.
//!
//! # Quick Start
//!
//! ```
//! use fundsim::{
//!     engine::{BacktestConfig, BacktestEngine},
//!     strategies::TopByFeature,
//!     types::FundRecord,
//!     universe::Universe,
//! };
//!
//! let universe = Universe::build(vec![
//!     FundRecord::new("steady", vec![1.01, 1.01, 1.01, 1.01]),
//!     FundRecord::new("volatile", vec![0.95, 1.10, 0.92, 1.08]),
//! ])
//! .unwrap();
//!
//! let config = BacktestConfig::default();
//! let engine = BacktestEngine::new(&universe, &config);
//! let result = engine.run(&mut TopByFeature::best_return(1));
//!
//! println!("{}\t{}", result.strategy_name, result.score);
//! assert_eq!(result.months_used, 3);
//! ```
//!
//! # Creating Custom Strategies
//!
//! Implement the [`SelectionStrategy`] trait:
//!
//! ```
//! use fundsim::strategy::{SelectionContext, SelectionStrategy};
//! use fundsim::types::Pick;
//!
//! struct Oldest;
//!
//! impl SelectionStrategy for Oldest {
//!     fn name(&self) -> &str {
//!         "oldest"
//!     }
//!
//!     fn choose(&mut self, ctx: &SelectionContext) -> Vec<Pick> {
//!         ctx.eligible(0)
//!             .into_iter()
//!             .max_by_key(|&i| ctx.fund(i).duration())
//!             .map(|i| vec![Pick::equal(i)])
//!             .unwrap_or_default()
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! - [`types`]: Fund records, feature kinds and picks
//! - [`period`]: Triangular period tables
//! - [`features`]: Per-fund feature tables and summaries
//! - [`ratio`]: Ratio-to-best normalization
//! - [`optimum`]: The optimum fund
//! - [`universe`]: Immutable context shared by every backtest
//! - [`strategy`]: Strategy trait and context
//! - [`strategies`]: Built-in strategies and their serializable descriptions
//! - [`engine`]: Backtest execution engine
//! - [`sweep`]: Parallel evaluation of many strategies
//! - [`optimize`]: Weight search for the weighted strategy
//! - [`benchmark`]: Comparison against a benchmark rate
//! - [`data`]: Fund file and auxiliary file loading
//! - [`export`]: Training data and result export
//! - [`analytics`]: Aggregation and report formatting
//! - [`config`]: TOML configuration file support

pub mod analytics;
pub mod benchmark;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod features;
pub mod optimize;
pub mod optimum;
pub mod period;
pub mod ratio;
pub mod strategies;
pub mod strategy;
pub mod sweep;
pub mod types;
pub mod universe;

// Re-exports for convenience
pub use analytics::{median, Aggregation, ResultFormatter, ReturnMeasure, NOT_COMPUTABLE};
pub use engine::{BacktestConfig, BacktestEngine, BacktestResult};
pub use error::{FundError, Result};
pub use features::{FeatureSet, FundSummary};
pub use optimum::OptimumFund;
pub use period::PeriodTable;
pub use ratio::{RatioNormalizer, RatioTable};
pub use strategy::{SelectionContext, SelectionStrategy};
pub use sweep::{StrategySweep, SweepGrid};
pub use types::{Direction, FeatureKind, FundRecord, Pick};
pub use universe::Universe;

// Data handling re-exports
pub use data::{load_funds, parse_funds, DataConfig};
