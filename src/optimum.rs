//! The optimum fund: best realized return of any fund for every period.
//!
//! It is a ceiling used to express how much of the attainable return a
//! strategy captured. It is never a candidate for selection.

use crate::analytics::annualize;
use crate::features::FeatureSet;
use crate::period::PeriodTable;

/// Synthetic table of the best compounded return per period.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptimumFund {
    returns: PeriodTable,
}

impl OptimumFund {
    /// Compute the per-period maximum of the funds' return tables.
    pub fn compute(sets: &[&FeatureSet]) -> Self {
        let duration = sets.iter().map(|s| s.duration()).max().unwrap_or(0);
        let mut returns = PeriodTable::filled(duration, 0.0);
        for end in 0..duration {
            for span in 0..duration - end {
                let best = sets
                    .iter()
                    .filter_map(|set| set.returns().get(end, span))
                    .fold(0.0, f64::max);
                returns.set(end, span, best);
            }
        }
        Self { returns }
    }

    /// Number of months covered (the longest fund history).
    pub fn duration(&self) -> usize {
        self.returns.duration()
    }

    /// Best compounded return of the period. Panics outside the table.
    pub fn value_at(&self, end: usize, span: usize) -> f64 {
        self.returns.value_at(end, span)
    }

    /// Best compounded return of the period, annualized.
    pub fn annualized(&self, end: usize, span: usize) -> f64 {
        annualize(self.value_at(end, span), span + 1)
    }

    /// The underlying table.
    pub fn table(&self) -> &PeriodTable {
        &self.returns
    }
}
