//! The fund universe: every table a backtest reads, built once.
//!
//! A [`Universe`] owns the fund records, their feature tables, the cohort
//! ratio tables and the optimum fund. It is constructed single-threaded and
//! never mutated afterwards, so concurrent backtests share it by reference.

use crate::error::{FundError, Result};
use crate::features::FeatureSet;
use crate::optimum::OptimumFund;
use crate::ratio::{RatioNormalizer, RatioTable};
use crate::types::FundRecord;
use tracing::info;

/// A fund record together with its feature tables.
#[derive(Debug, Clone)]
pub struct Fund {
    pub record: FundRecord,
    pub features: FeatureSet,
}

impl Fund {
    /// Build the feature tables of a record.
    pub fn new(record: FundRecord) -> Self {
        let features = FeatureSet::build(&record.monthly);
        Self { record, features }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn duration(&self) -> usize {
        self.record.duration()
    }

    /// Whether the fund has a return for month `t`.
    pub fn covers(&self, t: usize) -> bool {
        t < self.duration()
    }

    /// Months of history from `t` (inclusive) back to inception.
    pub fn remaining(&self, t: usize) -> usize {
        self.duration().saturating_sub(t)
    }
}

/// Immutable context shared by every strategy and backtest.
#[derive(Debug, Clone)]
pub struct Universe {
    funds: Vec<Fund>,
    ratios: Vec<RatioTable>,
    optimum: OptimumFund,
}

impl Universe {
    /// Build all tables for the given records.
    ///
    /// Fails on an empty input or on a record holding a non-positive or
    /// non-finite multiplier.
    pub fn build(records: Vec<FundRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(FundError::NoData);
        }
        if let Some(bad) = records.iter().find(|r| !r.validate()) {
            return Err(FundError::InvalidInput(format!(
                "fund '{}' has a non-positive monthly multiplier",
                bad.name
            )));
        }

        let funds: Vec<Fund> = records.into_iter().map(Fund::new).collect();
        let sets: Vec<&FeatureSet> = funds.iter().map(|f| &f.features).collect();
        let ratios = RatioNormalizer::normalize(&sets);
        let optimum = OptimumFund::compute(&sets);

        info!(
            "Built tables for {} funds over {} months",
            funds.len(),
            optimum.duration()
        );

        Ok(Self {
            funds,
            ratios,
            optimum,
        })
    }

    /// All funds, in input order.
    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    pub fn fund(&self, index: usize) -> &Fund {
        &self.funds[index]
    }

    /// Ratio tables of the fund at `index`.
    pub fn ratios(&self, index: usize) -> &RatioTable {
        &self.ratios[index]
    }

    pub fn optimum(&self) -> &OptimumFund {
        &self.optimum
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    /// Length of the longest fund history.
    pub fn max_duration(&self) -> usize {
        self.optimum.duration()
    }

    /// Indices of the funds with a return for month `t`.
    pub fn active_at(&self, t: usize) -> Vec<usize> {
        self.funds
            .iter()
            .enumerate()
            .filter(|(_, f)| f.covers(t))
            .map(|(i, _)| i)
            .collect()
    }

    /// Index of the fund with the given name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.funds.iter().position(|f| f.name() == name)
    }
}
