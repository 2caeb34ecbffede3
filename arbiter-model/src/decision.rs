//! Scheduling decisions: the atomic unit the trace records and replay consumes.

use std::fmt;

use crate::ids::{OperationId, SequenceId};

/// The kind of scheduling point a decision was made at. Mirrors the instrumentation callback
/// surface in `§6` of the specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulingPointKind {
    OnCreate,
    OnSend,
    OnReceiveBlocking,
    OnYield,
    OnContinueWith,
    OnCompleted,
    InterleaveMemoryAccess,
    InterleaveControlFlow,
    OnResourceAcquire,
    OnResourceRelease,
}

impl fmt::Display for SchedulingPointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulingPointKind::OnCreate => "create",
            SchedulingPointKind::OnSend => "send",
            SchedulingPointKind::OnReceiveBlocking => "receive",
            SchedulingPointKind::OnYield => "yield",
            SchedulingPointKind::OnContinueWith => "continue",
            SchedulingPointKind::OnCompleted => "completed",
            SchedulingPointKind::InterleaveMemoryAccess => "memory",
            SchedulingPointKind::InterleaveControlFlow => "control-flow",
            SchedulingPointKind::OnResourceAcquire => "acquire",
            SchedulingPointKind::OnResourceRelease => "release",
        };
        write!(f, "{s}")
    }
}

/// A single decision the exploration strategy made, as recorded in the execution trace.
///
/// The two nondeterministic-data variants never cause a context switch: `current_op` keeps running
/// immediately after the decision is recorded.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulingDecision {
    /// The strategy chose `next_op` to run next at a scheduling point of the given kind.
    Operation {
        current_op: OperationId,
        current_seq: SequenceId,
        point: SchedulingPointKind,
        next_op: OperationId,
        next_seq: SequenceId,
    },
    /// The strategy resolved a `NondeterministicBoolean` request.
    Boolean {
        current_op: OperationId,
        current_seq: SequenceId,
        value: bool,
    },
    /// The strategy resolved a `NondeterministicInteger` request.
    Integer {
        current_op: OperationId,
        current_seq: SequenceId,
        value: u64,
    },
}

impl SchedulingDecision {
    /// The operation that was active when this decision was made.
    pub fn current_op(&self) -> OperationId {
        match self {
            SchedulingDecision::Operation { current_op, .. }
            | SchedulingDecision::Boolean { current_op, .. }
            | SchedulingDecision::Integer { current_op, .. } => *current_op,
        }
    }

    /// The sequence id the active operation had when this decision was made.
    pub fn current_seq(&self) -> SequenceId {
        match self {
            SchedulingDecision::Operation { current_seq, .. }
            | SchedulingDecision::Boolean { current_seq, .. }
            | SchedulingDecision::Integer { current_seq, .. } => *current_seq,
        }
    }

    /// The scheduling point kind, when this decision is an operation choice.
    pub fn point(&self) -> Option<SchedulingPointKind> {
        match self {
            SchedulingDecision::Operation { point, .. } => Some(*point),
            _ => None,
        }
    }
}

/// Serialized one-line form matching the spec's `"op(<id>:<seq>),sp(<point>),next(<id>:<seq>)"`
/// step encoding used by the JSON trace report.
impl fmt::Display for SchedulingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingDecision::Operation {
                current_op,
                current_seq,
                point,
                next_op,
                next_seq,
            } => write!(
                f,
                "op({current_op}:{current_seq}),sp({point}),next({next_op}:{next_seq})"
            ),
            SchedulingDecision::Boolean {
                current_op,
                current_seq,
                value,
            } => write!(f, "op({current_op}:{current_seq}),bool({value})"),
            SchedulingDecision::Integer {
                current_op,
                current_seq,
                value,
            } => write!(f, "op({current_op}:{current_seq}),int({value})"),
        }
    }
}
