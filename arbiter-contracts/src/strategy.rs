//! The exploration strategy contract: the pluggable decision surface the scheduler core calls
//! into at every scheduling point.

use std::fmt;

use thiserror::Error;

use arbiter_model::{IterationId, OperationId, SchedulingPointKind, SequenceId};

/// A strategy's view of the operations the scheduler core considers eligible at a scheduling
/// point. Strategies never see blocked or completed operations.
pub struct EnabledOperations<'a> {
    pub current: OperationId,
    pub current_seq: SequenceId,
    pub point: SchedulingPointKind,
    pub candidates: &'a [OperationId],
}

/// Errors a strategy can raise instead of resolving a decision.
///
/// Only the replay strategy currently produces these: every other strategy generates its own
/// choices and can never fail to answer.
#[derive(Error, Debug, Clone)]
pub enum StrategyError {
    /// The live `(op_id, sequence_id, kind)` coordinate of a decision no longer matches the
    /// recorded trace entry at the same cursor position.
    #[error("replay diverged from recorded trace: {0}")]
    ReplayMismatch(String),
}

/// Chooses which enabled operation runs next, and resolves nondeterministic booleans/integers.
///
/// Implementations are never required to be `Send` across await points themselves: the scheduler
/// core holds the strategy behind its own mutex and only ever calls it between await points, never
/// concurrently.
pub trait ExplorationStrategy: fmt::Debug {
    /// Picks the next operation to run from `choice.candidates`, which is always non-empty; the
    /// scheduler core never calls this with zero candidates.
    fn next_operation(&mut self, choice: EnabledOperations<'_>) -> Result<OperationId, StrategyError>;

    /// Resolves a `NondeterministicBoolean` request raised by the operation at `current`.
    fn next_boolean(
        &mut self,
        current: OperationId,
        current_seq: SequenceId,
    ) -> Result<bool, StrategyError>;

    /// Resolves a `NondeterministicInteger` request raised by the operation at `current`, bounded
    /// to `[0, max_value)`.
    fn next_integer(
        &mut self,
        current: OperationId,
        current_seq: SequenceId,
        max_value: u64,
    ) -> Result<u64, StrategyError>;

    /// Resets any per-iteration state and seeds the strategy for the next testing iteration.
    fn prepare_next_iteration(&mut self, iteration: IterationId);

    /// Upper bound on scheduling decisions this strategy will make before asking the engine to
    /// abandon the iteration as inconclusive. `None` means unbounded.
    fn max_steps(&self) -> Option<u64> {
        None
    }

    /// Short human-readable name used in trace and report output.
    fn description(&self) -> String;
}

/// Strategies that can additionally bias the fair wrapper's round-robin fallback, by reporting
/// whether a given operation should be exempted from fairness accounting (e.g. system operations).
pub trait FairnessHint {
    fn is_fairness_exempt(&self, op: OperationId) -> bool;
}
