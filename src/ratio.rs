//! Ratio-to-best normalization of feature tables.
//!
//! For each feature and each period, every fund valid at that period is
//! divided by the largest value any valid fund reached there. A weighted sum
//! of ratios is then comparable across features with different scales and
//! across windows of different lengths.

use crate::features::FeatureSet;
use crate::period::PeriodTable;
use crate::types::FeatureKind;
use tracing::debug;

/// Per-fund ratios of every feature to the cohort best, indexed by [`FeatureKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct RatioTable {
    tables: [PeriodTable; FeatureKind::COUNT],
}

impl RatioTable {
    fn empty(duration: usize) -> Self {
        Self {
            tables: std::array::from_fn(|_| PeriodTable::filled(duration, 0.0)),
        }
    }

    /// Ratio table of one feature.
    pub fn table(&self, kind: FeatureKind) -> &PeriodTable {
        &self.tables[kind.index()]
    }

    /// Ratio of a feature at `(end, span)`. Panics outside the fund's history.
    pub fn value(&self, kind: FeatureKind, end: usize, span: usize) -> f64 {
        self.table(kind).value_at(end, span)
    }

    /// Dot product of `weights` with the ratios at `(end, span)`.
    ///
    /// `weights[i]` applies to the feature of index `i`; a shorter vector
    /// leaves the remaining features out.
    pub fn weighted(&self, weights: &[f64], end: usize, span: usize) -> f64 {
        weights
            .iter()
            .zip(&self.tables)
            .map(|(w, table)| w * table.value_at(end, span))
            .sum()
    }
}

/// Builds ratio tables for a cohort of funds.
pub struct RatioNormalizer;

impl RatioNormalizer {
    /// Normalize every feature of every fund against the cohort.
    ///
    /// A fund takes part in a cell only if its history covers it. When the
    /// best value of a cell is exactly zero every valid fund gets ratio 1.
    pub fn normalize(sets: &[&FeatureSet]) -> Vec<RatioTable> {
        let mut ratios: Vec<RatioTable> = sets
            .iter()
            .map(|set| RatioTable::empty(set.duration()))
            .collect();
        let max_duration = sets.iter().map(|s| s.duration()).max().unwrap_or(0);

        for kind in FeatureKind::ALL {
            for end in 0..max_duration {
                for span in 0..max_duration - end {
                    let highest = sets
                        .iter()
                        .filter_map(|set| set.table(kind).get(end, span))
                        .fold(f64::NEG_INFINITY, f64::max);
                    if highest == f64::NEG_INFINITY {
                        continue;
                    }
                    for (set, ratio) in sets.iter().zip(ratios.iter_mut()) {
                        if let Some(value) = set.table(kind).get(end, span) {
                            let r = if highest == 0.0 { 1.0 } else { value / highest };
                            ratio.tables[kind.index()].set(end, span, r);
                        }
                    }
                }
            }
            debug!("Normalized feature {} over {} funds", kind, sets.len());
        }

        ratios
    }
}
