//! Configuration file support for sweeps.
//!
//! Allows loading sweep configurations from TOML files for reproducibility.
//! A file can ask for a strategy sweep, a benchmark comparison and a weight
//! search; [`SweepFileConfig::run`] performs all of them on one universe.

use crate::analytics::{Aggregation, ReturnMeasure};
use crate::benchmark::{BenchmarkComparison, BenchmarkSummary};
use crate::data::{load_funds, load_index_series, load_predictions, DataConfig};
use crate::engine::{BacktestConfig, BacktestResult};
use crate::error::{FundError, Result};
use crate::optimize::{OptimizerConfig, OptimizerRound, WeightOptimizer};
use crate::strategies::StrategySpec;
use crate::sweep::{StrategySweep, SweepGrid};
use crate::universe::Universe;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Complete sweep configuration loaded from a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepFileConfig {
    /// Input files.
    #[serde(default)]
    pub data: DataSettings,
    /// Backtest settings shared by every strategy.
    #[serde(default)]
    pub backtest: BacktestSettings,
    /// Generated grid of single-feature strategies.
    #[serde(default)]
    pub sweep: Option<SweepGrid>,
    /// Weight search settings.
    #[serde(default)]
    pub optimizer: Option<OptimizerConfig>,
    /// Explicitly listed strategies.
    #[serde(default)]
    pub strategies: Vec<StrategySpec>,
}

/// Output of [`SweepFileConfig::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigRun {
    /// One result per strategy, in configuration order.
    pub results: Vec<BacktestResult>,
    /// Present when `data.index` is set.
    pub benchmark: Option<BenchmarkSummary>,
    /// Rounds of the weight search, present when `[optimizer]` is set.
    pub optimizer: Option<Vec<OptimizerRound>>,
}

/// Input files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    /// Fund snapshot file.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Benchmark rate series.
    #[serde(default)]
    pub index: Option<PathBuf>,
    /// `name \t month` keys of precomputed scores.
    #[serde(default)]
    pub prediction_metadata: Option<PathBuf>,
    /// One score per metadata line.
    #[serde(default)]
    pub predictions: Option<PathBuf>,
    /// Funds with fewer months are ignored.
    #[serde(default = "default_min_months")]
    pub min_months: usize,
}

fn default_path() -> PathBuf {
    PathBuf::from("get.tsv")
}

fn default_min_months() -> usize {
    1
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: default_path(),
            index: None,
            prediction_metadata: None,
            predictions: None,
            min_months: default_min_months(),
        }
    }
}

/// Backtest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSettings {
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub return_measure: ReturnMeasure,
    /// Months of realized future; 0 measures up to the present.
    #[serde(default)]
    pub holding_months: usize,
    #[serde(default)]
    pub min_funds_threshold: usize,
    #[serde(default)]
    pub max_as_of: Option<usize>,
    /// Base seed of random strategies.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    42
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::default(),
            return_measure: ReturnMeasure::default(),
            holding_months: 0,
            min_funds_threshold: 0,
            max_as_of: None,
            seed: default_seed(),
        }
    }
}

impl SweepFileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: SweepFileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| FundError::ConfigError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Convert to BacktestConfig for the engine.
    pub fn to_backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            aggregation: self.backtest.aggregation,
            return_measure: self.backtest.return_measure,
            holding_months: self.backtest.holding_months,
            min_funds_threshold: self.backtest.min_funds_threshold,
            max_as_of: self.backtest.max_as_of,
        }
    }

    pub fn to_data_config(&self) -> DataConfig {
        DataConfig {
            min_months: self.data.min_months,
            ..Default::default()
        }
    }

    /// Listed strategies followed by the generated grid.
    ///
    /// Fails when the grid is invalid or when the file asks for nothing at
    /// all. The list is empty when only a benchmark or an optimizer is set.
    pub fn strategy_specs(&self) -> Result<Vec<StrategySpec>> {
        let mut specs = self.strategies.clone();
        if let Some(grid) = &self.sweep {
            grid.validate()?;
            specs.extend(grid.generate());
        }
        if specs.is_empty() && self.data.index.is_none() && self.optimizer.is_none() {
            return Err(FundError::ConfigError(
                "nothing to run: add [[strategies]], [sweep], [optimizer] or data.index"
                    .to_string(),
            ));
        }
        Ok(specs)
    }

    /// Load the data and run every section of the file.
    pub fn run(&self, show_progress: bool) -> Result<ConfigRun> {
        let specs = self.strategy_specs()?;
        let backtest = self.to_backtest_config();
        let universe = Universe::build(load_funds(&self.data.path, &self.to_data_config())?)?;

        let results = if specs.is_empty() {
            Vec::new()
        } else {
            let predictions = load_predictions(
                self.data.prediction_metadata.as_deref(),
                self.data.predictions.as_deref(),
            )?
            .map(Arc::new);
            info!("Running {} configured strategies", specs.len());
            StrategySweep::new(&universe, &backtest)
                .with_seed(self.backtest.seed)
                .with_predictions(predictions)
                .with_progress(show_progress)
                .run(&specs)?
        };

        let benchmark = match &self.data.index {
            Some(path) => {
                let series = load_index_series(path)?;
                Some(BenchmarkComparison::new(&universe, &series).summary(None)?)
            }
            None => None,
        };

        let optimizer = match &self.optimizer {
            Some(config) => {
                let mut optimizer = WeightOptimizer::new(&universe, &backtest, config.clone())?;
                Some(optimizer.run()?)
            }
            None => None,
        };

        Ok(ConfigRun {
            results,
            benchmark,
            optimizer,
        })
    }

    /// Generate an example configuration file.
    pub fn example() -> String {
        r#"# Fund strategy sweep configuration

[data]
path = "get.tsv"
# index = "cdi.tsv"
# prediction_metadata = "test_metadata.tsv"
# predictions = "test_predictions.tsv"
min_months = 1

[backtest]
aggregation = "median"        # median | mean
return_measure = "annualized" # annualized | simple
holding_months = 0            # 0 = up to the present
min_funds_threshold = 0
# max_as_of = 120
seed = 42

# Grid of single-feature strategies, plus one random baseline per fund count.
[sweep]
features = ["return", "median", "stdDev", "negativeMonthRatio", "greatestFall", "greatestFallLength"]
directions = ["highest", "lowest"]
include_random = true

[sweep.fund_counts]
start = 1
end = 5
step = 2

[sweep.lookbacks]
start = 0
end = 24
step = 12

[sweep.min_histories]
start = 0
end = 24
step = 12

[[strategies]]
type = "all"

[[strategies]]
type = "weighted"
num_funds = 3
weights = [1.0, 2.0, 0.0, 0.0, 0.0, 0.0]
lookback = 12
min_history = 12

[[strategies]]
type = "budget_greedy"
budget = 115000.0

# [[strategies]]
# type = "fixed"
# indices = [0, 4, 7]

# [[strategies]]
# type = "prediction"
# num_funds = 5

# Weight search for the weighted strategy, run after the sweep.
# [optimizer]
# num_funds = 3
# lookback = 3
# min_history = 6
# per_slot = false
# rounds = 20
# initial_step = 1.0
# seed = 0
"#
        .to_string()
    }
}
