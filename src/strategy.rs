//! Selection strategy trait and the context it is evaluated in.

use crate::types::Pick;
use crate::universe::{Fund, Universe};

/// Context provided to strategies at one as-of month.
///
/// A strategy may read any table cell `(end, span)` with `end >= as_of`;
/// those cells only cover months already known at `as_of`. Months below
/// `as_of` are the realized future and must not influence a choice.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Shared tables.
    pub universe: &'a Universe,
    /// Month the choice is made in (months ago).
    pub as_of: usize,
    /// Funds with a return for `as_of`, in universe order.
    pub candidates: &'a [usize],
}

impl<'a> SelectionContext<'a> {
    pub fn new(universe: &'a Universe, as_of: usize, candidates: &'a [usize]) -> Self {
        Self {
            universe,
            as_of,
            candidates,
        }
    }

    pub fn fund(&self, index: usize) -> &'a Fund {
        self.universe.fund(index)
    }

    /// Candidates with at least `min_history` months of history from `as_of`.
    pub fn eligible(&self, min_history: usize) -> Vec<usize> {
        self.candidates
            .iter()
            .copied()
            .filter(|&i| self.fund(i).remaining(self.as_of) >= min_history.max(1))
            .collect()
    }

    /// Span of the look-back window of a candidate.
    ///
    /// A `lookback` of 0 reads the fund's whole remaining history; a longer
    /// window than the history is clamped to it.
    pub fn window_span(&self, index: usize, lookback: usize) -> usize {
        let remaining = self.fund(index).remaining(self.as_of);
        let months = if lookback == 0 {
            remaining
        } else {
            lookback.min(remaining)
        };
        months.saturating_sub(1)
    }
}

/// Trait that all fund selection strategies implement.
pub trait SelectionStrategy: Send + Sync {
    /// Name used in reports; encodes the parameters.
    fn name(&self) -> &str;

    /// Choose funds among `ctx.candidates`. An empty result skips the month.
    fn choose(&mut self, ctx: &SelectionContext) -> Vec<Pick>;

    /// Months of history a fund needs at the as-of month to be eligible.
    fn min_history(&self) -> usize {
        0
    }

    /// Strategy parameters as key-value pairs for logging.
    fn parameters(&self) -> Vec<(String, String)> {
        vec![]
    }
}

/// Stable ranking of `(fund, score)` pairs, best first.
///
/// Equal scores keep their input order; NaN scores sort last.
pub(crate) fn rank_descending(scored: &mut [(usize, f64)]) {
    scored.sort_by(|a, b| match (a.1.is_nan(), b.1.is_nan()) {
        (false, false) => b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    });
}
