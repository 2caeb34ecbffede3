use thiserror::Error;

use arbiter_contracts::strategy::StrategyError;
use arbiter_model::OperationId;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("unknown operation: {0}")]
    UnknownOperation(OperationId),

    #[error("operation {0} is not enabled at this scheduling point")]
    NotEnabled(OperationId),

    #[error("a monitor tried to send an event from inside another monitor's handler")]
    NestedMonitorSend,

    #[error("safety violation: {0}")]
    SafetyViolation(String),

    /// §4.3.6/§7: the live `(op_id, sequence_id, kind)` coordinate at a decision point no longer
    /// matches the recorded trace entry at the same cursor.
    #[error("replay diverged from recorded trace: {0}")]
    ReplayMismatch(String),

    /// §4.2 arbitration step 8: the iteration ran past its configured step budget. Ends the
    /// iteration benignly rather than failing it.
    #[error("iteration exceeded its step budget")]
    StepBudgetExceeded,

    /// An `assume_at_most` bound would be violated by every remaining schedule; the iteration is
    /// pruned as inconclusive rather than treated as a safety failure.
    #[error("strategy assumption violated, schedule pruned as inconclusive: {0}")]
    InconclusiveAssumption(String),

    /// The run's cancellation token fired (e.g. the CLI caught Ctrl-C) before this iteration
    /// finished. Ends the iteration benignly, the same way a step budget overrun does.
    #[error("iteration cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    InvalidConfiguration(#[from] arbiter_model::ModelError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StrategyError> for SchedulerError {
    fn from(err: StrategyError) -> Self {
        match err {
            StrategyError::ReplayMismatch(message) => SchedulerError::ReplayMismatch(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
