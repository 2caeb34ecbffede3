use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, debug_span};

use arbiter_contracts::actor::{ActorBehavior, ActorTransition};
use arbiter_model::{Event, EventAction, EventType};

use crate::error::{Result, SchedulerError};

/// FIFO mailbox for one actor. Dispatch never reorders events: a deferred event stays in place and
/// is reconsidered the next time the actor's current state changes. A raised event is the one
/// exception: it is pushed to the front so it is considered before anything already queued.
#[derive(Debug, Default)]
struct ActorInbox {
    events: VecDeque<Event>,
}

impl ActorInbox {
    fn push_back(&mut self, event: Event) {
        self.events.push_back(event);
    }

    fn push_front(&mut self, event: Event) {
        self.events.push_front(event);
    }

    fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Live actor instance: its behavior, its state stack (for `push`/`pop` transitions), and its
/// pending inbox.
///
/// Mirrors the shape of `DefaultLibraryActor` with its `config`/`state` split collapsed into one
/// cell, since the scheduler core (unlike a long-lived orchestrator) owns exactly one cell per
/// actor operation for the lifetime of a single iteration.
pub struct ActorCell {
    behavior: Box<dyn ActorBehavior>,
    state_stack: Vec<String>,
    inbox: ActorInbox,
    halted: bool,
}

impl ActorCell {
    pub fn new(behavior: Box<dyn ActorBehavior>) -> Self {
        let initial = behavior.initial_state();
        Self {
            behavior,
            state_stack: vec![initial],
            inbox: ActorInbox::default(),
            halted: false,
        }
    }

    pub fn current_state(&self) -> &str {
        self.state_stack
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn enqueue(&mut self, event: Event) {
        if !self.halted {
            self.inbox.push_back(event);
        }
    }

    pub fn inbox_is_empty(&self) -> bool {
        self.inbox.is_empty()
    }

    /// Number of pending inbox events of the given type, used to enforce `assert_at_most`/
    /// `assume_at_most` send metadata.
    pub fn count_pending(&self, event_type: &EventType) -> u32 {
        self.inbox
            .events
            .iter()
            .filter(|event| &event.event_type == event_type)
            .count() as u32
    }

    /// True if the current state would dispatch (not defer) at least one pending event. A halted
    /// actor never has anything dispatchable.
    pub fn has_dispatchable(&self) -> bool {
        if self.halted {
            return false;
        }
        let state = self.current_state();
        self.inbox
            .events
            .iter()
            .any(|event| self.behavior.classify(state, event) != EventAction::Defer)
    }

    /// Scans the inbox in FIFO order for the first event the current state doesn't defer, running
    /// its handler if found. `Defer`-classified events are skipped without being removed.
    ///
    /// Returns the action taken, or `None` if every queued event is deferred (or the inbox is
    /// empty), in which case this operation is blocked waiting on its inbox. Fails if the
    /// dispatched event was classified `Ignore` despite being marked `must_handle`: that overrides
    /// `Ignore` and turns a dropped event into a safety violation instead of silently discarding it.
    pub async fn dispatch_next(&mut self) -> Result<Option<EventAction>> {
        if self.halted {
            return Ok(None);
        }

        let state = self.current_state().to_string();
        let mut dispatch_index = None;
        for (index, event) in self.inbox.events.iter().enumerate() {
            match self.behavior.classify(&state, event) {
                EventAction::Defer => continue,
                action => {
                    dispatch_index = Some((index, action));
                    break;
                }
            }
        }

        let (index, action) = match dispatch_index {
            Some(found) => found,
            None => return Ok(None),
        };
        let event = self
            .inbox
            .events
            .remove(index)
            .expect("index came from iterating the same deque");
        let span = debug_span!("actor_dispatch", state = %state, event = %event.event_type);
        let _enter = span.enter();

        match action {
            EventAction::Ignore => {
                if event.metadata.must_handle {
                    return Err(SchedulerError::SafetyViolation(format!(
                        "must-handle event `{}` was classified ignore in state `{state}`",
                        event.event_type
                    )));
                }
                debug!("ignored event");
            }
            EventAction::Halt => {
                self.halted = true;
                debug!("actor halted");
            }
            EventAction::Handle => {
                let transition = self.behavior.handle(&state, event).await;
                self.apply_transition(transition);
            }
            EventAction::Defer => unreachable!("defer is filtered out above"),
        }

        Ok(Some(action))
    }

    /// Pushes `event` to the front of the inbox and dispatches immediately, without going through
    /// the scheduler core: a raised event is handled next regardless of inbox order, synchronously,
    /// with no scheduling point in between.
    pub async fn raise_now(&mut self, event: Event) -> Result<Option<EventAction>> {
        if !self.halted {
            self.inbox.push_front(event);
        }
        self.dispatch_next().await
    }

    fn apply_transition(&mut self, transition: ActorTransition) {
        match transition {
            ActorTransition::Stay => {}
            ActorTransition::Goto(state) => {
                self.state_stack.pop();
                self.state_stack.push(state);
            }
            ActorTransition::Push(state) => self.state_stack.push(state),
            ActorTransition::Pop => {
                self.state_stack.pop();
            }
            ActorTransition::Halt => self.halted = true,
        }
    }
}

/// Shared handle to an actor cell; the scheduler core holds one per actor operation.
pub type ActorHandle = Arc<Mutex<ActorCell>>;

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_model::{OperationId, SendMetadata};
    use async_trait::async_trait;

    struct Counter {
        handled: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl ActorBehavior for Counter {
        fn initial_state(&self) -> String {
            "counting".to_string()
        }

        fn classify(&self, _state: &str, event: &Event) -> EventAction {
            if event.event_type.0 == "skip" {
                EventAction::Defer
            } else {
                EventAction::Handle
            }
        }

        async fn handle(&mut self, _state: &str, _event: Event) -> ActorTransition {
            self.handled
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            ActorTransition::Stay
        }
    }

    struct AlwaysIgnore;

    #[async_trait]
    impl ActorBehavior for AlwaysIgnore {
        fn initial_state(&self) -> String {
            "open".to_string()
        }

        fn classify(&self, _state: &str, _event: &Event) -> EventAction {
            EventAction::Ignore
        }

        async fn handle(&mut self, _state: &str, _event: Event) -> ActorTransition {
            ActorTransition::Stay
        }
    }

    #[tokio::test]
    async fn deferred_events_stay_queued_until_dispatchable_one_arrives() {
        let mut cell = ActorCell::new(Box::new(Counter {
            handled: std::sync::atomic::AtomicUsize::new(0),
        }));
        cell.enqueue(Event::new("skip", serde_json::Value::Null, OperationId(1), "counting"));
        cell.enqueue(Event::new("go", serde_json::Value::Null, OperationId(1), "counting"));

        let action = cell.dispatch_next().await.unwrap();
        assert_eq!(action, Some(EventAction::Handle));
        assert!(!cell.inbox_is_empty());
    }

    #[tokio::test]
    async fn all_deferred_returns_none() {
        let mut cell = ActorCell::new(Box::new(Counter {
            handled: std::sync::atomic::AtomicUsize::new(0),
        }));
        cell.enqueue(Event::new("skip", serde_json::Value::Null, OperationId(1), "counting")
            .with_metadata(SendMetadata::default()));
        assert_eq!(cell.dispatch_next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn must_handle_event_classified_ignore_is_a_safety_violation() {
        let mut cell = ActorCell::new(Box::new(AlwaysIgnore));
        let event = Event::new("urgent", serde_json::Value::Null, OperationId(1), "open")
            .with_metadata(SendMetadata {
                must_handle: true,
                ..SendMetadata::default()
            });
        cell.enqueue(event);

        let err = cell.dispatch_next().await.unwrap_err();
        assert!(matches!(err, SchedulerError::SafetyViolation(_)));
    }

    #[tokio::test]
    async fn raise_now_jumps_ahead_of_already_queued_events() {
        let mut cell = ActorCell::new(Box::new(Counter {
            handled: std::sync::atomic::AtomicUsize::new(0),
        }));
        cell.enqueue(Event::new("skip", serde_json::Value::Null, OperationId(1), "counting"));

        let action = cell
            .raise_now(Event::new("urgent", serde_json::Value::Null, OperationId(1), "counting"))
            .await
            .unwrap();
        assert_eq!(action, Some(EventAction::Handle));
        // The deferred "skip" event is still queued behind the raised one.
        assert!(!cell.inbox_is_empty());
    }
}
