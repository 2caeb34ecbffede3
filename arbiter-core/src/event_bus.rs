use std::fmt;

use tokio::sync::broadcast;

use arbiter_model::{IterationId, IterationOutcome, SchedulingDecision};

/// One notification fanned out to observers of a test run.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    IterationStarted(IterationId),
    Decision {
        iteration: IterationId,
        decision: SchedulingDecision,
    },
    IterationFinished {
        iteration: IterationId,
        outcome: IterationOutcome,
    },
}

/// In-process fan-out of engine activity to any number of observers (a CLI progress bar, a
/// coverage collector, a test harness assertion). Kept separate from
/// [`arbiter_contracts::callbacks::SchedulerCallbacks`] so a subscriber can be added or removed at
/// any point during a run without the engine holding a reference to it.
pub struct DecisionBus {
    sender: broadcast::Sender<EngineEvent>,
    capacity: usize,
}

impl fmt::Debug for DecisionBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionBus")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl DecisionBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: EngineEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for DecisionBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

pub trait EngineEventStream {
    fn subscribe_engine(&self) -> broadcast::Receiver<EngineEvent>;
}

impl EngineEventStream for DecisionBus {
    fn subscribe_engine(&self) -> broadcast::Receiver<EngineEvent> {
        self.subscribe()
    }
}
