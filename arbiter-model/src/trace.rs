//! The execution trace: the ordered decision log that makes an iteration replayable.

use std::fmt;

use crate::decision::SchedulingDecision;
use crate::ids::IterationId;

/// One recorded step of an iteration: a decision plus the callsite that triggered it, when known.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceEntry {
    pub decision: SchedulingDecision,
    #[cfg_attr(feature = "serde", serde(default))]
    pub callsite: Option<String>,
}

impl From<SchedulingDecision> for TraceEntry {
    fn from(decision: SchedulingDecision) -> Self {
        Self {
            decision,
            callsite: None,
        }
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.decision)
    }
}

/// The full ordered decision log produced by one testing iteration.
///
/// Replaying a trace means feeding its entries back to the strategy in order instead of letting it
/// decide freshly; see the `replay` strategy and the JSON schema in `§6`.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionTrace {
    pub iteration: IterationId,
    pub seed: u64,
    pub entries: Vec<TraceEntry>,
}

impl ExecutionTrace {
    pub fn new(iteration: IterationId, seed: u64) -> Self {
        Self {
            iteration,
            seed,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: impl Into<TraceEntry>) {
        self.entries.push(entry.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::SchedulingDecision;
    use crate::ids::{OperationId, SequenceId};

    #[test]
    fn push_appends_in_order() {
        let mut trace = ExecutionTrace::new(IterationId(0), 42);
        trace.push(SchedulingDecision::Boolean {
            current_op: OperationId::ROOT,
            current_seq: SequenceId(0),
            value: true,
        });
        trace.push(SchedulingDecision::Integer {
            current_op: OperationId::ROOT,
            current_seq: SequenceId(1),
            value: 7,
        });
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.entries[0].decision.current_seq(), SequenceId(0));
        assert_eq!(trace.entries[1].decision.current_seq(), SequenceId(1));
    }
}
