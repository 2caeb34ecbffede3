use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use arbiter_config::StrategyBound;
use arbiter_contracts::strategy::{EnabledOperations, ExplorationStrategy, StrategyError};
use arbiter_model::{IterationId, OperationId, SequenceId};

/// Picks the enabled operation highest in a randomized priority order, reshuffling a random
/// operation to the back of the order at a handful of "priority change points" per iteration.
///
/// The number of allowed change points is bounded by [`StrategyBound::max_priority_switch_points`]:
/// once spent, the remainder of the iteration runs the current order deterministically, trading
/// exploration breadth for a search space small enough to replay and re-shrink.
pub struct PriorityBasedBoundedStrategy {
    base_seed: u64,
    rng: ChaCha8Rng,
    bound: StrategyBound,
    priority_order: Vec<OperationId>,
    remaining_switch_points: u32,
}

impl fmt::Debug for PriorityBasedBoundedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityBasedBoundedStrategy")
            .field("priority_order_len", &self.priority_order.len())
            .field("remaining_switch_points", &self.remaining_switch_points)
            .finish()
    }
}

impl PriorityBasedBoundedStrategy {
    pub fn new(seed: u64, bound: StrategyBound) -> Self {
        Self {
            base_seed: seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            bound,
            priority_order: Vec::new(),
            remaining_switch_points: bound.max_priority_switch_points,
        }
    }

    /// Appends any candidate not yet ranked to the back of the priority order, lowest priority.
    fn ensure_ranked(&mut self, candidates: &[OperationId]) {
        for &candidate in candidates {
            if !self.priority_order.contains(&candidate) {
                self.priority_order.push(candidate);
            }
        }
    }

    /// Randomly demotes one ranked operation to the back of the order, spending one switch point.
    fn maybe_reprioritize(&mut self) {
        if self.remaining_switch_points == 0 || self.priority_order.len() < 2 {
            return;
        }
        if !self.rng.random_bool(0.5) {
            return;
        }
        let index = self.rng.random_range(0..self.priority_order.len());
        let demoted = self.priority_order.remove(index);
        self.priority_order.push(demoted);
        self.remaining_switch_points -= 1;
    }
}

impl ExplorationStrategy for PriorityBasedBoundedStrategy {
    fn next_operation(&mut self, choice: EnabledOperations<'_>) -> Result<OperationId, StrategyError> {
        self.ensure_ranked(choice.candidates);
        self.maybe_reprioritize();

        Ok(self
            .priority_order
            .iter()
            .find(|op| choice.candidates.contains(op))
            .copied()
            .expect("priority order contains every candidate after ensure_ranked"))
    }

    fn next_boolean(&mut self, _current: OperationId, _current_seq: SequenceId) -> Result<bool, StrategyError> {
        Ok(self.rng.random_bool(0.5))
    }

    fn next_integer(
        &mut self,
        _current: OperationId,
        _current_seq: SequenceId,
        max_value: u64,
    ) -> Result<u64, StrategyError> {
        Ok(if max_value == 0 {
            0
        } else {
            self.rng.random_range(0..max_value)
        })
    }

    fn prepare_next_iteration(&mut self, iteration: IterationId) {
        self.rng = ChaCha8Rng::seed_from_u64(self.base_seed.wrapping_add(iteration.0));
        self.priority_order.clear();
        self.remaining_switch_points = self.bound.max_priority_switch_points;
    }

    fn description(&self) -> String {
        "priority-based-bounded".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_ranked_keeps_previously_ranked_relative_order() {
        let mut strategy = PriorityBasedBoundedStrategy::new(1, StrategyBound::default());
        strategy.ensure_ranked(&[OperationId(1), OperationId(2)]);
        strategy.ensure_ranked(&[OperationId(2), OperationId(3)]);
        assert_eq!(
            strategy.priority_order,
            vec![OperationId(1), OperationId(2), OperationId(3)]
        );
    }
}
