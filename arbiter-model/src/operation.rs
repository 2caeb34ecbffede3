//! The `Operation` data model: identity, status, and the blocking predicates a controlled
//! operation can be waiting on.

use std::collections::BTreeSet;
use std::fmt;

use crate::event::EventType;
use crate::ids::OperationId;

/// What kind of controlled unit an [`crate::ids::OperationId`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationKind {
    /// A cooperatively-scheduled task spawned via `create_task`.
    Task,
    /// An actor with an inbox, spawned via `create_actor`.
    Actor,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Task => write!(f, "task"),
            OperationKind::Actor => write!(f, "actor"),
        }
    }
}

/// Why a blocked operation cannot currently run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockReason {
    /// Waiting for a specific other operation to complete (`OnContinueWith` / join).
    WaitingOnCompletion(OperationId),
    /// Waiting for a resource predicate (lock, semaphore slot) to hold.
    WaitingOnResource {
        /// Name of the resource, for trace/coverage reporting.
        resource: String,
    },
    /// Waiting for an inbox event whose type is in the given set to become dispatchable.
    WaitingOnInbox(BTreeSet<EventType>),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::WaitingOnCompletion(op) => write!(f, "waiting on op({op}) to complete"),
            BlockReason::WaitingOnResource { resource } => {
                write!(f, "waiting on resource `{resource}`")
            }
            BlockReason::WaitingOnInbox(types) => {
                write!(f, "waiting on inbox event in {{")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Scheduling status of a controlled operation.
///
/// Invariant: at most one operation in a registry is ever treated as "running" between scheduling
/// points — this enum only distinguishes the states a scheduling point can observe, not a live
/// "currently executing" flag, which the scheduler core tracks separately.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationStatus {
    /// Created but not yet scheduled for the first time.
    None,
    /// Eligible to be chosen by the exploration strategy.
    Enabled,
    /// Not eligible; see [`BlockReason`] for why.
    Blocked(BlockReason),
    /// Reached `OnCompleted`; never scheduled again.
    Completed,
}

impl OperationStatus {
    /// True when the strategy may pick this operation at the current scheduling point.
    pub fn is_enabled(&self) -> bool {
        matches!(self, OperationStatus::Enabled)
    }

    /// True once the operation has reached `OnCompleted`.
    pub fn is_completed(&self) -> bool {
        matches!(self, OperationStatus::Completed)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::None => write!(f, "none"),
            OperationStatus::Enabled => write!(f, "enabled"),
            OperationStatus::Blocked(reason) => write!(f, "blocked({reason})"),
            OperationStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One controlled unit of concurrent execution under the scheduler.
///
/// Operations are arena-allocated in the registry, keyed by [`OperationId`]; they never outlive the
/// testing iteration that created them.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Operation {
    pub id: OperationId,
    pub kind: OperationKind,
    pub description: String,
    pub status: OperationStatus,
    /// The callsite string last reported by the instrumented operation, used for coverage and
    /// trace reporting.
    pub last_callsite: Option<String>,
    /// Group id used by strategies that bias scheduling by logical grouping (e.g. all actors in
    /// one "Chord" ring).
    pub group_id: Option<u32>,
    /// Whether the fair wrapper should treat this operation's scheduling fairly. Root/system
    /// operations may be marked unfair so they never starve the strategy's priority order.
    pub is_fair: bool,
}

impl Operation {
    /// Creates a freshly spawned operation in the `None` status.
    pub fn new(id: OperationId, kind: OperationKind, description: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            description: description.into(),
            status: OperationStatus::None,
            last_callsite: None,
            group_id: None,
            is_fair: true,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op({}) [{}] {}", self.id, self.kind, self.description)
    }
}
