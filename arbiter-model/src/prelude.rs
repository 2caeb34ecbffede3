//! Engine-focused snapshot of the types surface.
//! Prefer importing from this module instead of individual tree nodes when
//! working in arbiter-core or the runner.

pub use super::decision::{SchedulingDecision, SchedulingPointKind};
pub use super::error::{ModelError, Result as ModelResult};
pub use super::event::{Event, EventAction, EventType, SendMetadata};
pub use super::ids::{IterationId, MonitorId, OperationId, SequenceId};
pub use super::liveness::{LivenessViolation, StateTemperature};
pub use super::operation::{BlockReason, Operation, OperationKind, OperationStatus};
pub use super::report::{IterationOutcome, IterationRecord, TestReport};
pub use super::strategy_kind::{Portfolio, StrategyKind};
pub use super::trace::{ExecutionTrace, TraceEntry};
