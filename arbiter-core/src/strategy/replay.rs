use arbiter_contracts::strategy::{EnabledOperations, ExplorationStrategy, StrategyError};
use arbiter_model::{ExecutionTrace, IterationId, OperationId, SchedulingDecision, SequenceId};

/// Replays a previously recorded [`ExecutionTrace`] instead of deciding freshly.
///
/// At every decision, asserts that the live `(op_id, sequence_id, kind)` coordinate matches the
/// recorded entry at the same cursor position before trusting its recorded answer. If the program
/// under test has changed since the trace was recorded, that assertion fails and replay aborts
/// with [`StrategyError::ReplayMismatch`] rather than silently substituting a fallback value: a
/// replay that diverges quietly is worse than no replay at all, since it reports a normal outcome
/// for a run that didn't actually follow the recorded schedule.
#[derive(Debug)]
pub struct ReplayStrategy {
    trace: ExecutionTrace,
    cursor: usize,
}

impl ReplayStrategy {
    pub fn new(trace: ExecutionTrace) -> Self {
        Self { trace, cursor: 0 }
    }

    fn next_entry(&mut self) -> Option<SchedulingDecision> {
        let entry = self.trace.entries.get(self.cursor)?.decision.clone();
        self.cursor += 1;
        Some(entry)
    }
}

impl ExplorationStrategy for ReplayStrategy {
    fn next_operation(&mut self, choice: EnabledOperations<'_>) -> Result<OperationId, StrategyError> {
        match self.next_entry() {
            Some(
                entry @ SchedulingDecision::Operation {
                    current_op,
                    current_seq,
                    point,
                    next_op,
                    ..
                },
            ) if current_op == choice.current && current_seq == choice.current_seq && point == choice.point => {
                if choice.candidates.contains(&next_op) {
                    Ok(next_op)
                } else {
                    Err(StrategyError::ReplayMismatch(format!(
                        "recorded next operation {next_op} is no longer enabled (trace entry: {entry})"
                    )))
                }
            }
            Some(entry) => Err(StrategyError::ReplayMismatch(format!(
                "expected an operation decision for op({}:{}) at {}, trace had {entry}",
                choice.current, choice.current_seq, choice.point
            ))),
            None => Err(StrategyError::ReplayMismatch(
                "trace exhausted before the program under test reached this scheduling point".to_string(),
            )),
        }
    }

    fn next_boolean(&mut self, current: OperationId, current_seq: SequenceId) -> Result<bool, StrategyError> {
        match self.next_entry() {
            Some(SchedulingDecision::Boolean { current_op, current_seq: seq, value })
                if current_op == current && seq == current_seq =>
            {
                Ok(value)
            }
            Some(entry) => Err(StrategyError::ReplayMismatch(format!(
                "expected a boolean decision for op({current}:{current_seq}), trace had {entry}"
            ))),
            None => Err(StrategyError::ReplayMismatch(
                "trace exhausted before the program under test reached this boolean choice".to_string(),
            )),
        }
    }

    fn next_integer(
        &mut self,
        current: OperationId,
        current_seq: SequenceId,
        max_value: u64,
    ) -> Result<u64, StrategyError> {
        match self.next_entry() {
            Some(SchedulingDecision::Integer { current_op, current_seq: seq, value })
                if current_op == current
                    && seq == current_seq
                    && (value < max_value || max_value == 0) =>
            {
                Ok(value)
            }
            Some(entry) => Err(StrategyError::ReplayMismatch(format!(
                "expected an integer decision for op({current}:{current_seq}) bounded by {max_value}, trace had {entry}"
            ))),
            None => Err(StrategyError::ReplayMismatch(
                "trace exhausted before the program under test reached this integer choice".to_string(),
            )),
        }
    }

    fn prepare_next_iteration(&mut self, _iteration: IterationId) {
        self.cursor = 0;
    }

    fn description(&self) -> String {
        "replay".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_model::{IterationId, SchedulingPointKind};

    fn trace_with_one_operation_decision() -> ExecutionTrace {
        let mut trace = ExecutionTrace::new(IterationId(0), 1);
        trace.push(SchedulingDecision::Operation {
            current_op: OperationId(1),
            current_seq: SequenceId(1),
            point: SchedulingPointKind::OnYield,
            next_op: OperationId(2),
            next_seq: SequenceId(1),
        });
        trace
    }

    #[test]
    fn replays_a_matching_decision() {
        let mut strategy = ReplayStrategy::new(trace_with_one_operation_decision());
        let candidates = [OperationId(1), OperationId(2)];
        let choice = EnabledOperations {
            current: OperationId(1),
            current_seq: SequenceId(1),
            point: SchedulingPointKind::OnYield,
            candidates: &candidates,
        };
        assert_eq!(strategy.next_operation(choice).unwrap(), OperationId(2));
    }

    #[test]
    fn a_different_current_coordinate_is_a_replay_mismatch() {
        let mut strategy = ReplayStrategy::new(trace_with_one_operation_decision());
        let candidates = [OperationId(1), OperationId(2)];
        let choice = EnabledOperations {
            current: OperationId(1),
            current_seq: SequenceId(2),
            point: SchedulingPointKind::OnYield,
            candidates: &candidates,
        };
        let err = strategy.next_operation(choice).unwrap_err();
        assert!(matches!(err, StrategyError::ReplayMismatch(_)));
    }

    #[test]
    fn a_recorded_choice_no_longer_enabled_is_a_replay_mismatch() {
        let mut strategy = ReplayStrategy::new(trace_with_one_operation_decision());
        let candidates = [OperationId(1)];
        let choice = EnabledOperations {
            current: OperationId(1),
            current_seq: SequenceId(1),
            point: SchedulingPointKind::OnYield,
            candidates: &candidates,
        };
        let err = strategy.next_operation(choice).unwrap_err();
        assert!(matches!(err, StrategyError::ReplayMismatch(_)));
    }
}
