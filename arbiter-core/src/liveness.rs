use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use arbiter_model::{LivenessViolation, MonitorId, StateTemperature};

use crate::error::{Result, SchedulerError};

/// Static shape of a liveness monitor: which of its states are hot, which are cold. Every other
/// state is neutral.
#[derive(Debug, Clone)]
pub struct MonitorDefinition {
    pub name: String,
    pub hot_states: HashSet<String>,
    pub cold_states: HashSet<String>,
}

impl MonitorDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hot_states: HashSet::new(),
            cold_states: HashSet::new(),
        }
    }

    pub fn with_hot_state(mut self, state: impl Into<String>) -> Self {
        self.hot_states.insert(state.into());
        self
    }

    pub fn with_cold_state(mut self, state: impl Into<String>) -> Self {
        self.cold_states.insert(state.into());
        self
    }

    fn temperature_of(&self, state: &str) -> StateTemperature {
        if self.hot_states.contains(state) {
            StateTemperature::Hot
        } else if self.cold_states.contains(state) {
            StateTemperature::Cold
        } else {
            StateTemperature::Neutral
        }
    }
}

struct MonitorInstance {
    definition: MonitorDefinition,
    current_state: String,
    temperature: u32,
}

/// Tracks every liveness monitor registered for an iteration, following the hot/cold temperature
/// rule: temperature increments on every scheduling decision taken while a monitor sits in a hot
/// state, resets to zero on entering a cold state, and is left unchanged in a neutral state.
///
/// Guarded the same way [`crate::registry::OperationRegistry`] is: one mutex around the shared
/// map, matching the correlation-cache pattern used elsewhere for small shared lookup tables.
pub struct LivenessMonitorSet {
    monitors: Arc<Mutex<HashMap<MonitorId, MonitorInstance>>>,
    seen_state_hashes: Arc<Mutex<HashSet<u64>>>,
    dispatching: AtomicBool,
    temperature_threshold: u32,
}

impl LivenessMonitorSet {
    pub fn new(temperature_threshold: u32) -> Self {
        Self {
            monitors: Arc::new(Mutex::new(HashMap::new())),
            seen_state_hashes: Arc::new(Mutex::new(HashSet::new())),
            dispatching: AtomicBool::new(false),
            temperature_threshold,
        }
    }

    pub async fn register(&self, id: MonitorId, definition: MonitorDefinition) {
        let mut guard = self.monitors.lock().await;
        guard.insert(
            id,
            MonitorInstance {
                definition,
                current_state: String::new(),
                temperature: 0,
            },
        );
    }

    /// Transitions a monitor to `new_state`, updating its temperature per the hot/cold rule.
    ///
    /// Rejects being called while another monitor's transition is already in flight: monitor
    /// handlers run synchronously with respect to each other, and a monitor sending an event from
    /// inside another monitor's handler is an internal programming error, not a race to tolerate.
    pub async fn transition(&self, id: MonitorId, new_state: impl Into<String>) -> Result<()> {
        if self
            .dispatching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SchedulerError::NestedMonitorSend);
        }

        let result = self.transition_inner(id, new_state).await;
        self.dispatching.store(false, Ordering::SeqCst);
        result
    }

    async fn transition_inner(&self, id: MonitorId, new_state: impl Into<String>) -> Result<()> {
        let new_state = new_state.into();
        let mut guard = self.monitors.lock().await;
        let instance = guard
            .get_mut(&id)
            .ok_or_else(|| SchedulerError::Internal(format!("unknown monitor {id}")))?;

        // Entering cold resets temperature immediately; entering or staying hot does not bump it
        // here. Temperature only accumulates through `tick`, which the scheduler core calls once
        // per fair scheduling step regardless of whether a transition happened that step.
        if matches!(instance.definition.temperature_of(&new_state), StateTemperature::Cold) {
            instance.temperature = 0;
        }
        instance.current_state = new_state;
        Ok(())
    }

    /// Increments the temperature of every monitor currently sitting in a hot state. Called by the
    /// scheduler core on every fair scheduling step, independent of whether any monitor received a
    /// new `transition` that step: a monitor that goes hot and then just sits there while other
    /// operations keep running still needs its temperature to keep rising.
    pub async fn tick(&self) {
        let mut guard = self.monitors.lock().await;
        for instance in guard.values_mut() {
            if matches!(
                instance.definition.temperature_of(&instance.current_state),
                StateTemperature::Hot
            ) {
                instance.temperature += 1;
            }
        }
    }

    /// Checks every monitor's temperature against the threshold, returning a violation for each
    /// monitor that exceeded it.
    pub async fn check_temperatures(&self) -> Vec<LivenessViolation> {
        let guard = self.monitors.lock().await;
        guard
            .iter()
            .filter(|(_, instance)| instance.temperature > self.temperature_threshold)
            .map(|(id, instance)| {
                warn!(monitor = %instance.definition.name, temperature = instance.temperature, "liveness temperature exceeded");
                LivenessViolation::temperature_exceeded(
                    *id,
                    instance.definition.name.clone(),
                    instance.current_state.clone(),
                )
            })
            .collect()
    }

    /// Records the current global state hash (see `SendMetadata::hashed_state`) and reports a
    /// cycle violation if the same hash has been observed before while any monitor is hot.
    pub async fn record_state_hash(&self, hash: u64) -> Vec<LivenessViolation> {
        let mut seen = self.seen_state_hashes.lock().await;
        let is_repeat = !seen.insert(hash);
        drop(seen);

        if !is_repeat {
            return Vec::new();
        }

        let guard = self.monitors.lock().await;
        guard
            .iter()
            .filter(|(_, instance)| {
                matches!(
                    instance.definition.temperature_of(&instance.current_state),
                    StateTemperature::Hot
                )
            })
            .map(|(id, instance)| {
                LivenessViolation::cycle_detected(
                    *id,
                    instance.definition.name.clone(),
                    instance.current_state.clone(),
                )
            })
            .collect()
    }

    pub async fn reset(&self) {
        self.monitors.lock().await.clear();
        self.seen_state_hashes.lock().await.clear();
        self.dispatching.store(false, Ordering::SeqCst);
    }
}
