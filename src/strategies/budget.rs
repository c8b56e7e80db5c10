//! Budget-constrained selection by minimum investment.

use crate::strategy::{rank_descending, SelectionContext, SelectionStrategy};
use crate::types::Pick;

/// Invests each fund's minimum amount in rank order until the budget runs out.
///
/// Funds are ranked by annualized return over their whole history up to the
/// as-of month. The walk stops at the first fund whose minimum exceeds what
/// is left of the budget; cheaper funds further down are not considered.
/// Each pick is weighted by the amount invested in it.
#[derive(Debug, Clone)]
pub struct BudgetGreedy {
    budget: f64,
    min_history: usize,
    name: String,
}

impl BudgetGreedy {
    pub fn new(budget: f64, min_history: usize) -> Self {
        Self {
            budget,
            min_history,
            name: format!("budget({},{})", budget, min_history),
        }
    }
}

impl SelectionStrategy for BudgetGreedy {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &SelectionContext) -> Vec<Pick> {
        let mut scored: Vec<(usize, f64)> = ctx
            .eligible(self.min_history)
            .into_iter()
            .map(|i| {
                let span = ctx.window_span(i, 0);
                (i, ctx.fund(i).features.returns().annualized(ctx.as_of, span))
            })
            .collect();
        rank_descending(&mut scored);

        let mut left = self.budget;
        let mut picks = Vec::new();
        for (fund, _) in scored {
            let minimum = ctx.fund(fund).record.minimum_investment;
            if minimum > left {
                break;
            }
            left -= minimum;
            picks.push(Pick {
                fund,
                weight: minimum,
            });
        }
        picks
    }

    fn min_history(&self) -> usize {
        self.min_history
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("budget".to_string(), self.budget.to_string()),
            ("min_history".to_string(), self.min_history.to_string()),
        ]
    }
}
