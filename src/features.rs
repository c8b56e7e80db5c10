//! Per-period statistics of a fund's history.
//!
//! For every period `(end, span)` a [`FeatureSet`] holds the compounded
//! return, the median monthly multiplier, the population standard deviation,
//! the negative-month ratio and the greatest fall with its length. Each
//! feature is a [`PeriodTable`] with the same triangular shape as the return
//! table, built by extending `span` one month at a time from every `end`.

use crate::analytics::{annualize, insert_sorted, median_from_sorted};
use crate::period::PeriodTable;
use crate::types::FeatureKind;
use serde::{Deserialize, Serialize};

/// All feature tables of one fund, indexed by [`FeatureKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    tables: [PeriodTable; FeatureKind::COUNT],
}

impl FeatureSet {
    /// Build every feature table from monthly multipliers (index 0 = most recent).
    pub fn build(monthly: &[f64]) -> Self {
        let (greatest_fall, greatest_fall_length) = greatest_fall_tables(monthly);
        Self {
            tables: [
                PeriodTable::build(monthly),
                median_table(monthly),
                std_dev_table(monthly),
                negative_month_ratio_table(monthly),
                greatest_fall,
                greatest_fall_length,
            ],
        }
    }

    /// Number of months covered.
    pub fn duration(&self) -> usize {
        self.tables[0].duration()
    }

    /// Table of one feature.
    pub fn table(&self, kind: FeatureKind) -> &PeriodTable {
        &self.tables[kind.index()]
    }

    /// The compounded-return table.
    pub fn returns(&self) -> &PeriodTable {
        self.table(FeatureKind::Return)
    }

    /// Value of a feature at `(end, span)`. Panics outside the table.
    pub fn value(&self, kind: FeatureKind, end: usize, span: usize) -> f64 {
        self.table(kind).value_at(end, span)
    }

    /// Whole-history statistics, or `None` for an empty history.
    pub fn summary(&self) -> Option<FundSummary> {
        let duration = self.duration();
        if duration == 0 {
            return None;
        }
        let span = duration - 1;
        Some(FundSummary {
            age_months: duration,
            std_dev: self.value(FeatureKind::StdDev, 0, span),
            negative_month_ratio: self.value(FeatureKind::NegativeMonthRatio, 0, span),
            greatest_fall: self.value(FeatureKind::GreatestFall, 0, span),
            greatest_fall_length: self.value(FeatureKind::GreatestFallLength, 0, span) as usize,
            annualized_return: annualize(self.value(FeatureKind::Return, 0, span), duration),
        })
    }

    /// Mean annualized return of every contiguous sub-period of `(end, span)`.
    pub fn mean_sub_period_return(&self, end: usize, span: usize) -> f64 {
        let returns = self.returns();
        let last = end + span;
        let mut total = 0.0;
        let mut count = 0usize;
        for e in end..=last {
            for s in 0..=last - e {
                total += returns.annualized(e, s);
                count += 1;
            }
        }
        total / count as f64
    }

    /// [`FeatureSet::mean_sub_period_return`] for every cell.
    pub fn sub_period_table(&self) -> PeriodTable {
        let returns = self.returns();
        let duration = self.duration();
        let rows = (0..duration)
            .map(|end| {
                let mut total = 0.0;
                let mut count = 0usize;
                (0..duration - end)
                    .map(|span| {
                        // Sub-periods whose oldest month is `end + span`.
                        let last = end + span;
                        for e in end..=last {
                            total += returns.annualized(e, last - e);
                            count += 1;
                        }
                        total / count as f64
                    })
                    .collect()
            })
            .collect();
        PeriodTable::from_rows(rows)
    }
}

/// Whole-history statistics of one fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundSummary {
    pub age_months: usize,
    pub std_dev: f64,
    pub negative_month_ratio: f64,
    pub greatest_fall: f64,
    pub greatest_fall_length: usize,
    pub annualized_return: f64,
}

fn median_table(monthly: &[f64]) -> PeriodTable {
    let duration = monthly.len();
    let rows = (0..duration)
        .map(|end| {
            let mut sorted = Vec::with_capacity(duration - end);
            monthly[end..]
                .iter()
                .map(|&m| {
                    insert_sorted(&mut sorted, m);
                    median_from_sorted(&sorted)
                })
                .collect()
        })
        .collect();
    PeriodTable::from_rows(rows)
}

// Welford's running mean and sum of squared deviations.
fn std_dev_table(monthly: &[f64]) -> PeriodTable {
    let duration = monthly.len();
    let rows = (0..duration)
        .map(|end| {
            let mut mean = 0.0;
            let mut m2 = 0.0;
            monthly[end..]
                .iter()
                .enumerate()
                .map(|(i, &m)| {
                    let count = (i + 1) as f64;
                    let delta = m - mean;
                    mean += delta / count;
                    m2 += delta * (m - mean);
                    (m2 / count).max(0.0).sqrt()
                })
                .collect()
        })
        .collect();
    PeriodTable::from_rows(rows)
}

fn negative_month_ratio_table(monthly: &[f64]) -> PeriodTable {
    let duration = monthly.len();
    let rows = (0..duration)
        .map(|end| {
            let mut negative = 0usize;
            monthly[end..]
                .iter()
                .enumerate()
                .map(|(i, &m)| {
                    if m < 1.0 {
                        negative += 1;
                    }
                    negative as f64 / (i + 1) as f64
                })
                .collect()
        })
        .collect();
    PeriodTable::from_rows(rows)
}

/// Greatest fall and its length for every period.
///
/// Scanning from `end` toward older months, the running product restarts at
/// the current month whenever that month alone is lower than the product, so
/// the tracked run is the worst one ending at the current month. The minimum
/// over the scan starts at 1 (no fall) and only a strictly lower value
/// replaces it, so ties keep the first occurrence and its length.
fn greatest_fall_tables(monthly: &[f64]) -> (PeriodTable, PeriodTable) {
    let duration = monthly.len();
    let mut falls = Vec::with_capacity(duration);
    let mut lengths = Vec::with_capacity(duration);
    for end in 0..duration {
        let mut fall_row = Vec::with_capacity(duration - end);
        let mut length_row = Vec::with_capacity(duration - end);
        let mut greatest = 1.0;
        let mut greatest_len = 0usize;
        let mut current = 1.0;
        let mut current_len = 0usize;
        for &m in &monthly[end..] {
            current *= m;
            current_len += 1;
            if m < current {
                current = m;
                current_len = 1;
            }
            if current < greatest {
                greatest = current;
                greatest_len = current_len;
            }
            fall_row.push(greatest);
            length_row.push(greatest_len as f64);
        }
        falls.push(fall_row);
        lengths.push(length_row);
    }
    (PeriodTable::from_rows(falls), PeriodTable::from_rows(lengths))
}
