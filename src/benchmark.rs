//! Comparison of the fund universe against a benchmark rate series.

use crate::analytics::annualize;
use crate::error::{FundError, Result};
use crate::universe::Universe;
use serde::{Deserialize, Serialize};

/// Monthly multipliers of a benchmark rate, index 0 = most recent month.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexSeries {
    pub name: String,
    pub monthly: Vec<f64>,
}

impl IndexSeries {
    pub fn new(name: impl Into<String>, monthly: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            monthly,
        }
    }

    pub fn len(&self) -> usize {
        self.monthly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monthly.is_empty()
    }

    /// Multiplier of month `t`, if the series covers it.
    pub fn get(&self, t: usize) -> Option<f64> {
        self.monthly.get(t).copied()
    }

    /// Annualized multiplier of months `end..=end + span`, if covered.
    pub fn annualized(&self, end: usize, span: usize) -> Option<f64> {
        let months = self.monthly.get(end..=end + span)?;
        Some(annualize(months.iter().product(), span + 1))
    }
}

/// Excess return of a fund over the benchmark for one month.
pub fn excess(fund: f64, index: f64) -> f64 {
    fund - index
}

/// Both ratios of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    /// Name of the benchmark series.
    pub index: String,
    pub average_ratio: f64,
    pub optimum_ratio: f64,
}

/// Benchmark comparisons over the most recent `months` months.
pub struct BenchmarkComparison<'a> {
    universe: &'a Universe,
    index: &'a IndexSeries,
}

impl<'a> BenchmarkComparison<'a> {
    pub fn new(universe: &'a Universe, index: &'a IndexSeries) -> Self {
        Self { universe, index }
    }

    /// Number of months compared: `months`, or the whole universe when None.
    ///
    /// Fails when the benchmark series is shorter than that.
    fn horizon(&self, months: Option<usize>) -> Result<usize> {
        let duration = months.unwrap_or_else(|| self.universe.max_duration());
        if duration == 0 {
            return Err(FundError::NoData);
        }
        if self.index.len() < duration {
            return Err(FundError::InvalidInput(format!(
                "benchmark '{}' covers {} months, {} needed",
                self.index.name,
                self.index.len(),
                duration
            )));
        }
        Ok(duration)
    }

    /// Mean over months of the cross-fund average multiplier divided by the
    /// benchmark multiplier. Months without any fund are left out.
    pub fn average_ratio_to_index(&self, months: Option<usize>) -> Result<f64> {
        let duration = self.horizon(months)?;
        let mut total = 0.0;
        let mut counted = 0usize;
        for t in 0..duration {
            let values: Vec<f64> = self
                .universe
                .funds()
                .iter()
                .filter(|f| f.covers(t))
                .map(|f| f.record.monthly[t])
                .collect();
            if values.is_empty() {
                continue;
            }
            let average = values.iter().sum::<f64>() / values.len() as f64;
            total += average / self.index.monthly[t];
            counted += 1;
        }
        if counted == 0 {
            return Err(FundError::NoData);
        }
        Ok(total / counted as f64)
    }

    /// Mean over months of the optimum fund's one-month multiplier divided by
    /// the benchmark multiplier.
    pub fn optimum_ratio_to_index(&self, months: Option<usize>) -> Result<f64> {
        let duration = self.horizon(months)?.min(self.universe.max_duration());
        let optimum = self.universe.optimum();
        let total: f64 = (0..duration)
            .map(|t| optimum.value_at(t, 0) / self.index.monthly[t])
            .sum();
        Ok(total / duration as f64)
    }

    pub fn summary(&self, months: Option<usize>) -> Result<BenchmarkSummary> {
        Ok(BenchmarkSummary {
            index: self.index.name.clone(),
            average_ratio: self.average_ratio_to_index(months)?,
            optimum_ratio: self.optimum_ratio_to_index(months)?,
        })
    }

    /// Per-month excess of a fund over the benchmark, most recent first.
    pub fn fund_excess(&self, fund: usize) -> Vec<f64> {
        self.universe
            .fund(fund)
            .record
            .monthly
            .iter()
            .zip(&self.index.monthly)
            .map(|(&f, &i)| excess(f, i))
            .collect()
    }
}
