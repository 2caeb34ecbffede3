use arbiter_contracts::strategy::{EnabledOperations, ExplorationStrategy, StrategyError};
use arbiter_model::{IterationId, OperationId, SequenceId};

#[derive(Debug, Clone, Copy)]
struct ChoicePoint {
    chosen_index: usize,
    candidate_count: usize,
}

/// Exhaustively enumerates interleavings by always taking, at each scheduling point, the lowest
/// unexplored candidate index; between iterations it backtracks to the rightmost choice point that
/// still has an unexplored alternative and replays every choice up to it unchanged.
///
/// This makes the search systematic rather than random: given enough iterations with no behavior
/// change in the program under test, depth-first search visits every reachable interleaving
/// exactly once. [`Self::is_exhausted`] reports when that has happened.
#[derive(Debug, Default)]
pub struct DepthFirstStrategy {
    /// The path taken by the previous iteration, to replay up to `replay_len`.
    previous_path: Vec<ChoicePoint>,
    /// How much of `previous_path` to replay verbatim before falling back to "leftmost" choices.
    replay_len: usize,
    /// The path being built during the current iteration.
    current_path: Vec<ChoicePoint>,
    exhausted: bool,
}

impl DepthFirstStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn choose(&mut self, candidate_count: usize) -> usize {
        let depth = self.current_path.len();
        let chosen_index = if depth < self.replay_len {
            self.previous_path[depth].chosen_index.min(candidate_count - 1)
        } else {
            0
        };
        self.current_path.push(ChoicePoint {
            chosen_index,
            candidate_count,
        });
        chosen_index
    }
}

impl ExplorationStrategy for DepthFirstStrategy {
    fn next_operation(&mut self, choice: EnabledOperations<'_>) -> Result<OperationId, StrategyError> {
        let index = self.choose(choice.candidates.len());
        Ok(choice.candidates[index])
    }

    fn next_boolean(&mut self, _current: OperationId, _current_seq: SequenceId) -> Result<bool, StrategyError> {
        Ok(self.choose(2) == 1)
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
            self.choose(max_value as usize) as u64
        })
    }

    fn prepare_next_iteration(&mut self, _iteration: IterationId) {
        // Find the rightmost choice point in the path just completed that has an unexplored
        // alternative, bump it, and discard everything after it.
        let mut backtrack_at = None;
        for (depth, point) in self.current_path.iter().enumerate().rev() {
            if point.chosen_index + 1 < point.candidate_count {
                backtrack_at = Some(depth);
                break;
            }
        }

        match backtrack_at {
            Some(depth) => {
                let mut next_path = self.current_path[..=depth].to_vec();
                next_path[depth].chosen_index += 1;
                self.replay_len = next_path.len();
                self.previous_path = next_path;
            }
            None => {
                self.exhausted = true;
                self.replay_len = 0;
                self.previous_path.clear();
            }
        }
        self.current_path.clear();
    }

    fn description(&self) -> String {
        "depth-first".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(candidates: &[OperationId]) -> EnabledOperations<'_> {
        EnabledOperations {
            current: OperationId(0),
            current_seq: SequenceId(0),
            point: arbiter_model::SchedulingPointKind::OnYield,
            candidates,
        }
    }

    #[test]
    fn second_iteration_explores_the_next_branch() {
        let candidates = [OperationId(1), OperationId(2)];
        let mut strategy = DepthFirstStrategy::new();

        let first = strategy.next_operation(choice(&candidates)).unwrap();
        assert_eq!(first, OperationId(1));
        strategy.prepare_next_iteration(IterationId(1));

        let second = strategy.next_operation(choice(&candidates)).unwrap();
        assert_eq!(second, OperationId(2));
        strategy.prepare_next_iteration(IterationId(2));

        assert!(strategy.is_exhausted());
    }
}
