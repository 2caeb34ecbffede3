use arbiter_contracts::strategy::{EnabledOperations, ExplorationStrategy, StrategyError};
use arbiter_model::{IterationId, OperationId, SequenceId};

/// Wraps any strategy, forcing round-robin selection once the inner strategy has gone
/// [`Self::max_unfair_steps`] consecutive operation decisions without the round-robin cursor's
/// operation getting picked.
///
/// Strategies like priority-based-bounded or depth-first are not fair on their own: nothing stops
/// them from starving an enabled operation indefinitely. Wrapping them bounds how long that
/// starvation can last. Once the budget is spent, the wrapper stays in round-robin mode for the
/// rest of the iteration rather than handing control back to the inner strategy: a one-shot forced
/// pick wouldn't stop the inner strategy from immediately re-starving the same operation for
/// another `max_unfair_steps` window.
#[derive(Debug)]
pub struct FairWrapperStrategy {
    inner: Box<dyn ExplorationStrategy + Send>,
    max_unfair_steps: u32,
    steps_since_fair_pick: u32,
    round_robin_cursor: usize,
    round_robin_mode: bool,
}

impl FairWrapperStrategy {
    pub fn new(inner: Box<dyn ExplorationStrategy + Send>, max_unfair_steps: u32) -> Self {
        Self {
            inner,
            max_unfair_steps,
            steps_since_fair_pick: 0,
            round_robin_cursor: 0,
            round_robin_mode: false,
        }
    }
}

impl ExplorationStrategy for FairWrapperStrategy {
    fn next_operation(&mut self, choice: EnabledOperations<'_>) -> Result<OperationId, StrategyError> {
        if !self.round_robin_mode && self.steps_since_fair_pick >= self.max_unfair_steps {
            self.round_robin_mode = true;
        }

        if self.round_robin_mode {
            let index = self.round_robin_cursor % choice.candidates.len();
            self.round_robin_cursor = self.round_robin_cursor.wrapping_add(1);
            return Ok(choice.candidates[index]);
        }

        self.steps_since_fair_pick += 1;
        self.inner.next_operation(choice)
    }

    fn next_boolean(&mut self, current: OperationId, current_seq: SequenceId) -> Result<bool, StrategyError> {
        self.inner.next_boolean(current, current_seq)
    }

    fn next_integer(
        &mut self,
        current: OperationId,
        current_seq: SequenceId,
        max_value: u64,
    ) -> Result<u64, StrategyError> {
        self.inner.next_integer(current, current_seq, max_value)
    }

    fn prepare_next_iteration(&mut self, iteration: IterationId) {
        self.steps_since_fair_pick = 0;
        self.round_robin_cursor = 0;
        self.round_robin_mode = false;
        self.inner.prepare_next_iteration(iteration);
    }

    fn max_steps(&self) -> Option<u64> {
        self.inner.max_steps()
    }

    fn description(&self) -> String {
        format!("fair-wrapper({})", self.inner.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::random::RandomStrategy;

    #[test]
    fn stays_in_round_robin_for_the_rest_of_the_iteration_once_the_budget_is_spent() {
        let mut wrapper = FairWrapperStrategy::new(Box::new(RandomStrategy::new(1)), 2);
        let candidates = [OperationId(1), OperationId(2), OperationId(3)];
        let choice = || EnabledOperations {
            current: OperationId(0),
            current_seq: SequenceId(0),
            point: arbiter_model::SchedulingPointKind::OnYield,
            candidates: &candidates,
        };

        wrapper.next_operation(choice()).unwrap();
        wrapper.next_operation(choice()).unwrap();

        // Budget exhausted: every remaining pick this iteration must be round-robin, never
        // falling back to the inner strategy.
        let picks: Vec<_> = (0..6)
            .map(|_| wrapper.next_operation(choice()).unwrap())
            .collect();
        assert_eq!(
            picks,
            vec![
                OperationId(1),
                OperationId(2),
                OperationId(3),
                OperationId(1),
                OperationId(2),
                OperationId(3),
            ]
        );
    }

    #[test]
    fn prepare_next_iteration_resets_round_robin_mode() {
        let mut wrapper = FairWrapperStrategy::new(Box::new(RandomStrategy::new(1)), 1);
        let candidates = [OperationId(1), OperationId(2)];
        let choice = || EnabledOperations {
            current: OperationId(0),
            current_seq: SequenceId(0),
            point: arbiter_model::SchedulingPointKind::OnYield,
            candidates: &candidates,
        };

        wrapper.next_operation(choice()).unwrap();
        wrapper.next_operation(choice()).unwrap();
        assert!(wrapper.round_robin_mode);

        wrapper.prepare_next_iteration(IterationId(1));
        assert!(!wrapper.round_robin_mode);
    }
}
