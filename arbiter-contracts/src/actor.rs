//! The actor behavior contract: handler-table driven state machines scheduled through the inbox
//! protocol.

use async_trait::async_trait;

use arbiter_model::{Event, EventAction};

/// Result of dispatching one event to a state's handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorTransition {
    /// Stay in the current state.
    Stay,
    /// Replace the current state with a new one.
    Goto(String),
    /// Push a new state onto the actor's state stack, keeping the current one beneath it.
    Push(String),
    /// Pop the top of the state stack, returning control to the state beneath it.
    Pop,
    /// Halt the actor; no further events will be dispatched to it.
    Halt,
}

/// Implemented by user-defined actors; the scheduler core never constructs these directly but
/// drives them through the inbox protocol described alongside [`arbiter_model::operation::Operation`].
#[async_trait]
pub trait ActorBehavior: Send + Sync {
    /// Name of the state the actor starts in immediately after `OnCreate`.
    fn initial_state(&self) -> String;

    /// Looks up how the named state's handler table classifies an event type, without running the
    /// handler. Used by the scheduler core to decide `Handle`/`Defer`/`Ignore` before committing to
    /// a context switch.
    fn classify(&self, state: &str, event: &Event) -> EventAction;

    /// Runs the handler registered for `event` in `state`. Only called when [`Self::classify`]
    /// returned [`EventAction::Handle`] for the same event.
    async fn handle(&mut self, state: &str, event: Event) -> ActorTransition;
}
