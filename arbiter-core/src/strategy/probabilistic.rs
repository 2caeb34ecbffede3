use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use arbiter_contracts::strategy::{EnabledOperations, ExplorationStrategy, StrategyError};
use arbiter_model::{IterationId, OperationId, SequenceId};

/// Biased toward repeating the previous choice: on each decision, stays with the last-scheduled
/// operation (if it's still enabled) with probability [`Self::STICK_PROBABILITY`], otherwise picks
/// uniformly at random. This produces longer uninterrupted runs of a single operation than plain
/// [`super::random::RandomStrategy`], which tends to surface different classes of interleaving bug.
#[derive(Debug)]
pub struct ProbabilisticRandomStrategy {
    base_seed: u64,
    rng: ChaCha8Rng,
    last_scheduled: Option<OperationId>,
}

impl ProbabilisticRandomStrategy {
    const STICK_PROBABILITY: f64 = 0.7;

    pub fn new(seed: u64) -> Self {
        Self {
            base_seed: seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            last_scheduled: None,
        }
    }
}

impl ExplorationStrategy for ProbabilisticRandomStrategy {
    fn next_operation(&mut self, choice: EnabledOperations<'_>) -> Result<OperationId, StrategyError> {
        if let Some(last) = self.last_scheduled {
            if choice.candidates.contains(&last) && self.rng.random_bool(Self::STICK_PROBABILITY) {
                return Ok(last);
            }
        }
        let index = self.rng.random_range(0..choice.candidates.len());
        let chosen = choice.candidates[index];
        self.last_scheduled = Some(chosen);
        Ok(chosen)
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
        self.last_scheduled = None;
    }

    fn description(&self) -> String {
        "probabilistic-random".to_string()
    }
}
