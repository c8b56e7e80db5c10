//! Fixed fund lists for manual comparison.

use crate::strategy::{SelectionContext, SelectionStrategy};
use crate::types::Pick;

/// Always picks the funds at the given universe positions.
///
/// Positions that are not active at the as-of month are dropped, so the
/// realized return is only measured on funds that exist at that month.
#[derive(Debug, Clone)]
pub struct FixedIndices {
    indices: Vec<usize>,
    name: String,
}

impl FixedIndices {
    pub fn new(indices: Vec<usize>) -> Self {
        let listed: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
        Self {
            name: format!("fixed({})", listed.join(",")),
            indices,
        }
    }
}

impl SelectionStrategy for FixedIndices {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &SelectionContext) -> Vec<Pick> {
        self.indices
            .iter()
            .copied()
            .filter(|i| ctx.candidates.contains(i))
            .map(Pick::equal)
            .collect()
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![("indices".to_string(), format!("{:?}", self.indices))]
    }
}

/// Picks every eligible fund with equal weight.
#[derive(Debug, Clone)]
pub struct EqualWeightAll {
    min_history: usize,
    name: String,
}

impl EqualWeightAll {
    pub fn new(min_history: usize) -> Self {
        Self {
            min_history,
            name: format!("all({})", min_history),
        }
    }
}

impl SelectionStrategy for EqualWeightAll {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &SelectionContext) -> Vec<Pick> {
        ctx.eligible(self.min_history)
            .into_iter()
            .map(Pick::equal)
            .collect()
    }

    fn min_history(&self) -> usize {
        self.min_history
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![("min_history".to_string(), self.min_history.to_string())]
    }
}
