//! Events exchanged between actors through their inboxes.

use std::fmt;

use crate::ids::OperationId;

/// The type tag of an event. Handler tables classify dispatch behavior per `EventType`, so this is
/// the unit strategies and the inbox protocol reason about — never the payload itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventType(pub String);

impl EventType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Per-send metadata attached to an event, independent of its payload.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SendMetadata {
    /// If true, the receiving state's handler table must dispatch (not `ignore`) this event type,
    /// or the iteration fails as a safety violation.
    pub must_handle: bool,
    /// Safety invariant: after this send, the inbox must not contain more than this many events of
    /// the same type. Violating it is a safety bug.
    pub assert_at_most: Option<u32>,
    /// Strategy constraint: strategies must not choose a schedule that would push the post-send
    /// count of this event type above this bound. Violating the only remaining choice aborts the
    /// iteration as inconclusive, not failing.
    pub assume_at_most: Option<u32>,
    /// Contribution to the global state-caching hash used for liveness cycle detection.
    pub hashed_state: u64,
}

/// An immutable event enqueued into an actor's inbox.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub event_type: EventType,
    /// Serialized payload. Kept as an opaque JSON value so the core crate never needs to be
    /// generic over user payload types.
    #[cfg_attr(feature = "serde", serde(default))]
    pub payload: serde_json::Value,
    pub origin_op: OperationId,
    pub origin_state: String,
    pub metadata: SendMetadata,
}

impl Event {
    pub fn new(
        event_type: impl Into<EventType>,
        payload: serde_json::Value,
        origin_op: OperationId,
        origin_state: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            origin_op,
            origin_state: origin_state.into(),
            metadata: SendMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: SendMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from op({})/{}",
            self.event_type, self.origin_op, self.origin_state
        )
    }
}

/// How a state's handler table classifies a given event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventAction {
    /// Run the user handler for this event, optionally following a `goto`/`push`/`pop` transition.
    Handle,
    /// Skip over the event this step, leaving it in the inbox for a later state to dispatch.
    Defer,
    /// Dequeue and drop the event without running a handler.
    Ignore,
    /// The actor halts; further sends to it are ignored.
    Halt,
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventAction::Handle => "handle",
            EventAction::Defer => "defer",
            EventAction::Ignore => "ignore",
            EventAction::Halt => "halt",
        };
        write!(f, "{s}")
    }
}
