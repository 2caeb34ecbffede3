//! Instrumentation hooks the scheduler core fires around every scheduling decision, liveness
//! check, and iteration boundary. Kept separate from [`crate::strategy::ExplorationStrategy`] so a
//! report collector or coverage tool can observe a run without being in the decision path.

use arbiter_model::{
    IterationId, IterationOutcome, LivenessViolation, OperationId, SchedulingDecision,
};

/// Observes engine activity without influencing it. Default methods are no-ops so implementors
/// only override what they care about, mirroring the event-bus trait family in `arbiter-core`.
pub trait SchedulerCallbacks: Send + Sync {
    fn on_iteration_start(&self, _iteration: IterationId) {}

    fn on_decision(&self, _iteration: IterationId, _decision: &SchedulingDecision) {}

    fn on_operation_created(&self, _iteration: IterationId, _op: OperationId) {}

    fn on_liveness_violation(&self, _iteration: IterationId, _violation: &LivenessViolation) {}

    fn on_iteration_end(&self, _iteration: IterationId, _outcome: &IterationOutcome) {}
}

/// A callback sink that does nothing; the default when no observer is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCallbacks;

impl SchedulerCallbacks for NullCallbacks {}
