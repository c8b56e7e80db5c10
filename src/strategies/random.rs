//! Random selection baseline.

use crate::strategy::{SelectionContext, SelectionStrategy};
use crate::types::Pick;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Picks `num_funds` eligible funds uniformly at random.
///
/// Each instance owns its generator, so concurrent backtests never share a
/// random stream and a fixed seed reproduces the same choices.
#[derive(Debug, Clone)]
pub struct RandomPick {
    num_funds: usize,
    min_history: usize,
    rng: StdRng,
    name: String,
}

impl RandomPick {
    /// Create a random strategy with its own seeded generator.
    pub fn new(num_funds: usize, min_history: usize, seed: u64) -> Self {
        Self {
            num_funds,
            min_history,
            rng: StdRng::seed_from_u64(seed),
            name: format!("random({},{})", num_funds, min_history),
        }
    }
}

impl SelectionStrategy for RandomPick {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &SelectionContext) -> Vec<Pick> {
        let mut eligible = ctx.eligible(self.min_history);
        eligible.shuffle(&mut self.rng);
        eligible
            .into_iter()
            .take(self.num_funds)
            .map(Pick::equal)
            .collect()
    }

    fn min_history(&self) -> usize {
        self.min_history
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("num_funds".to_string(), self.num_funds.to_string()),
            ("min_history".to_string(), self.min_history.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FundRecord;
    use crate::universe::Universe;

    fn universe() -> Universe {
        Universe::build(
            (0..6)
                .map(|i| FundRecord::new(format!("f{}", i), vec![1.0 + i as f64 / 100.0; 3 + i]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_random_count_and_membership() {
        let universe = universe();
        let candidates = universe.active_at(1);
        let ctx = SelectionContext::new(&universe, 1, &candidates);
        let mut strategy = RandomPick::new(3, 0, 7);
        let picks = strategy.choose(&ctx);
        assert_eq!(picks.len(), 3);
        for pick in &picks {
            assert!(candidates.contains(&pick.fund));
        }
        let mut funds: Vec<usize> = picks.iter().map(|p| p.fund).collect();
        funds.sort_unstable();
        funds.dedup();
        assert_eq!(funds.len(), 3);
    }

    #[test]
    fn test_random_same_seed_same_choice() {
        let universe = universe();
        let candidates = universe.active_at(0);
        let ctx = SelectionContext::new(&universe, 0, &candidates);
        let a = RandomPick::new(2, 0, 42).choose(&ctx);
        let b = RandomPick::new(2, 0, 42).choose(&ctx);
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_respects_min_history() {
        let universe = universe();
        let candidates = universe.active_at(2);
        let ctx = SelectionContext::new(&universe, 2, &candidates);
        // Remaining history at month 2 is 1 + i months for fund i.
        let picks = RandomPick::new(10, 5, 1).choose(&ctx);
        let mut funds: Vec<usize> = picks.iter().map(|p| p.fund).collect();
        funds.sort_unstable();
        assert_eq!(funds, vec![4, 5]);
    }
}
