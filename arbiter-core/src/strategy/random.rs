use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use arbiter_contracts::strategy::{EnabledOperations, ExplorationStrategy, StrategyError};
use arbiter_model::{IterationId, OperationId, SequenceId};

/// Uniformly at random among enabled operations. The baseline strategy: no fairness bookkeeping,
/// no priority model, just an RNG reseeded deterministically per iteration from the run seed.
#[derive(Debug)]
pub struct RandomStrategy {
    base_seed: u64,
    iteration: u64,
    rng: ChaCha8Rng,
}

impl RandomStrategy {
    pub fn new(seed: u64) -> Self {
        Self {
            base_seed: seed,
            iteration: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl ExplorationStrategy for RandomStrategy {
    fn next_operation(&mut self, choice: EnabledOperations<'_>) -> Result<OperationId, StrategyError> {
        let index = self.rng.random_range(0..choice.candidates.len());
        Ok(choice.candidates[index])
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
        self.iteration = iteration.0;
        self.rng = ChaCha8Rng::seed_from_u64(self.base_seed.wrapping_add(iteration.0));
    }

    fn description(&self) -> String {
        "random".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_and_iteration_reproduce_the_same_choice() {
        let candidates = [OperationId(1), OperationId(2), OperationId(3)];
        fn choice(c: &[OperationId]) -> EnabledOperations<'_> {
            EnabledOperations {
                current: OperationId(0),
                current_seq: SequenceId(0),
                point: arbiter_model::SchedulingPointKind::OnYield,
                candidates: c,
            }
        }

        let mut a = RandomStrategy::new(7);
        a.prepare_next_iteration(IterationId(2));
        let mut b = RandomStrategy::new(7);
        b.prepare_next_iteration(IterationId(2));

        assert_eq!(
            a.next_operation(choice(&candidates)).unwrap(),
            b.next_operation(choice(&candidates)).unwrap()
        );
    }
}
