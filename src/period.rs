//! Triangular tables of per-period values.
//!
//! A table holds one value per period of a fund's history. A period is
//! identified by its most recent month `end` and by `span`, the number of
//! further (older) months it covers, so the cell `(end, span)` describes the
//! months `end ..= end + span`. A fund with `duration` months has cells for
//! every `end + span < duration`.

use crate::analytics::annualize;

/// Triangular per-period table, `rows[end][span]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PeriodTable {
    rows: Vec<Vec<f64>>,
}

impl PeriodTable {
    /// Build the compounded-return table of a monthly multiplier sequence.
    ///
    /// `period[end][0] == monthly[end]` and
    /// `period[end][span] == period[end][span - 1] * monthly[end + span]`.
    pub fn build(monthly: &[f64]) -> Self {
        let duration = monthly.len();
        let rows = (0..duration)
            .map(|end| {
                let mut row = Vec::with_capacity(duration - end);
                let mut product = 1.0;
                for m in &monthly[end..] {
                    product *= m;
                    row.push(product);
                }
                row
            })
            .collect();
        Self { rows }
    }

    /// Wrap already computed rows. Row `end` must hold `duration - end` cells.
    pub(crate) fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        debug_assert!(rows
            .iter()
            .enumerate()
            .all(|(end, row)| row.len() == rows.len() - end));
        Self { rows }
    }

    /// A table of the given duration with every cell set to `value`.
    pub(crate) fn filled(duration: usize, value: f64) -> Self {
        Self {
            rows: (0..duration).map(|end| vec![value; duration - end]).collect(),
        }
    }

    /// Number of months covered by the table.
    pub fn duration(&self) -> usize {
        self.rows.len()
    }

    /// Whether the cell `(end, span)` exists.
    pub fn contains(&self, end: usize, span: usize) -> bool {
        end + span < self.rows.len()
    }

    /// Value of the cell `(end, span)`.
    ///
    /// # Panics
    /// Panics when `end + span >= duration`; callers filter funds by duration
    /// before querying.
    pub fn value_at(&self, end: usize, span: usize) -> f64 {
        assert!(
            self.contains(end, span),
            "period ({}, {}) outside table of duration {}",
            end,
            span,
            self.rows.len()
        );
        self.rows[end][span]
    }

    /// Value of the cell `(end, span)`, if it exists.
    pub fn get(&self, end: usize, span: usize) -> Option<f64> {
        self.rows.get(end).and_then(|row| row.get(span)).copied()
    }

    pub(crate) fn set(&mut self, end: usize, span: usize, value: f64) {
        self.rows[end][span] = value;
    }

    /// Annualized value of a compounded-return cell.
    pub fn annualized(&self, end: usize, span: usize) -> f64 {
        annualize(self.value_at(end, span), span + 1)
    }

    /// Cells of the periods ending at `end`, ordered by span.
    pub fn row(&self, end: usize) -> &[f64] {
        &self.rows[end]
    }
}
