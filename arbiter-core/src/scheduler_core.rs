use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, warn};

use arbiter_config::FairnessConfig;
use arbiter_contracts::actor::ActorBehavior;
use arbiter_contracts::strategy::{EnabledOperations, ExplorationStrategy};
use arbiter_model::{
    BlockReason, Event, ExecutionTrace, IterationId, OperationId, OperationKind, OperationStatus,
    SchedulingDecision, SchedulingPointKind, SequenceId, TraceEntry,
};

use crate::actor::{ActorCell, ActorHandle};
use crate::error::{Result, SchedulerError};
use crate::liveness::LivenessMonitorSet;
use crate::registry::OperationRegistry;

/// Per-iteration arbitration: owns the operation registry and the exploration strategy for one
/// run through the program under test, and is the single place that records a decision to the
/// trace before acting on it.
///
/// Mirrors the "primary contract exposed to worker loops" shape of the job dispatcher: one
/// `dispatch`-like entry point (here, [`Self::schedule_point`]) fronting whatever bookkeeping the
/// concrete strategy needs.
pub struct SchedulerCore {
    registry: OperationRegistry,
    strategy: Arc<Mutex<Box<dyn ExplorationStrategy + Send>>>,
    trace: Mutex<ExecutionTrace>,
    sequence: Mutex<HashMap<OperationId, SequenceId>>,
    actors: Mutex<HashMap<OperationId, ActorHandle>>,
    deadlock_timeout: Duration,
    liveness: Arc<LivenessMonitorSet>,
    fairness: FairnessConfig,
    steps_taken: AtomicU64,
    cancellation: CancellationToken,
}

impl SchedulerCore {
    pub fn new(
        iteration: IterationId,
        seed: u64,
        strategy: Box<dyn ExplorationStrategy + Send>,
        deadlock_timeout: Duration,
        liveness: Arc<LivenessMonitorSet>,
        fairness: FairnessConfig,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            registry: OperationRegistry::new(),
            strategy: Arc::new(Mutex::new(strategy)),
            trace: Mutex::new(ExecutionTrace::new(iteration, seed)),
            sequence: Mutex::new(HashMap::new()),
            actors: Mutex::new(HashMap::new()),
            deadlock_timeout,
            liveness,
            fairness,
            steps_taken: AtomicU64::new(0),
            cancellation,
        }
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// The liveness monitor set for this iteration. The program under test registers and
    /// transitions its own monitors through this handle; the engine only checks temperatures
    /// and cycle state against it after the run completes.
    pub fn liveness(&self) -> &LivenessMonitorSet {
        &self.liveness
    }

    pub async fn take_trace(&self) -> ExecutionTrace {
        self.trace.lock().await.clone()
    }

    async fn advance_sequence(&self, op: OperationId) -> SequenceId {
        let mut guard = self.sequence.lock().await;
        guard.entry(op).or_default().advance()
    }

    async fn allocate_operation_id(&self) -> OperationId {
        let guard = self.sequence.lock().await;
        OperationId(guard.len() as u64 + 1)
    }

    pub async fn create_operation(&self, kind: OperationKind, description: impl Into<String>) -> OperationId {
        let next_id = self.allocate_operation_id().await;
        self.registry.spawn(next_id, kind, description).await;
        self.registry
            .set_status(next_id, OperationStatus::Enabled)
            .await
            .expect("operation was just spawned");
        next_id
    }

    /// Spawns a new actor operation (§4.1 `create_actor`): an inbox-driven state machine backed by
    /// `behavior`. It starts blocked on its (empty) inbox; sending it an event is what first makes
    /// it enabled.
    pub async fn create_actor(
        &self,
        behavior: Box<dyn ActorBehavior>,
        description: impl Into<String>,
    ) -> OperationId {
        let next_id = self.allocate_operation_id().await;
        self.registry.spawn(next_id, OperationKind::Actor, description).await;
        self.registry
            .set_status(
                next_id,
                OperationStatus::Blocked(BlockReason::WaitingOnInbox(BTreeSet::new())),
            )
            .await
            .expect("operation was just spawned");
        self.actors
            .lock()
            .await
            .insert(next_id, Arc::new(Mutex::new(ActorCell::new(behavior))));
        next_id
    }

    async fn actor_handle(&self, op: OperationId) -> Result<ActorHandle> {
        self.actors
            .lock()
            .await
            .get(&op)
            .cloned()
            .ok_or(SchedulerError::UnknownOperation(op))
    }

    /// Reflects an actor cell's post-dispatch state into the registry: completed once halted,
    /// enabled while something in its inbox is dispatchable, otherwise blocked waiting on the
    /// inbox.
    async fn sync_actor_status(&self, op: OperationId, cell: &ActorHandle) -> Result<()> {
        let guard = cell.lock().await;
        let status = if guard.is_halted() {
            OperationStatus::Completed
        } else if guard.has_dispatchable() {
            OperationStatus::Enabled
        } else {
            OperationStatus::Blocked(BlockReason::WaitingOnInbox(BTreeSet::new()))
        };
        drop(guard);
        self.registry.set_status(op, status).await
    }

    /// Enqueues `event` into `target`'s inbox (§4.1 `OnSend`), validates its safety/assumption
    /// metadata against the resulting inbox state, promotes `target` to enabled if it now has
    /// something dispatchable, and takes an `OnSend` scheduling point for `current`.
    pub async fn send(&self, current: OperationId, target: OperationId, event: Event) -> Result<()> {
        let cell = self.actor_handle(target).await?;

        let post_send_same_type_count = {
            let mut guard = cell.lock().await;
            guard.enqueue(event.clone());
            guard.count_pending(&event.event_type)
        };

        self.check_send_safety(&event, post_send_same_type_count)?;

        if let Some(bound) = event.metadata.assume_at_most {
            if post_send_same_type_count > bound {
                return Err(SchedulerError::InconclusiveAssumption(format!(
                    "more than {bound} pending `{}` events in op({target})'s inbox after send",
                    event.event_type
                )));
            }
        }

        self.sync_actor_status(target, &cell).await?;
        self.schedule_point(current, SchedulingPointKind::OnSend).await?;
        Ok(())
    }

    /// Drives one dispatch out of `actor_op`'s inbox (§4.1 `OnReceiveBlocking`), updates its
    /// registry status to reflect the result, then takes a scheduling point so the strategy can
    /// interleave other operations around the receive.
    pub async fn receive(&self, actor_op: OperationId) -> Result<Option<arbiter_model::EventAction>> {
        let cell = self.actor_handle(actor_op).await?;
        let action = {
            let mut guard = cell.lock().await;
            guard.dispatch_next().await?
        };
        self.sync_actor_status(actor_op, &cell).await?;
        self.schedule_point(actor_op, SchedulingPointKind::OnReceiveBlocking).await?;
        Ok(action)
    }

    /// Raises `event` on `actor_op` (§4.1 item 1): pushed to the front of its inbox and dispatched
    /// synchronously, with no scheduling point introduced, so it is handled next regardless of
    /// whatever else is already queued.
    pub async fn raise(&self, actor_op: OperationId, event: Event) -> Result<Option<arbiter_model::EventAction>> {
        let cell = self.actor_handle(actor_op).await?;
        let action = {
            let mut guard = cell.lock().await;
            guard.raise_now(event).await?
        };
        self.sync_actor_status(actor_op, &cell).await?;
        Ok(action)
    }

    /// Asks the strategy to choose the next operation to run at a scheduling point, recording the
    /// decision before returning it.
    ///
    /// Enforces the per-iteration step budget (§4.2 arbitration step 8) before doing anything else,
    /// and ticks every liveness monitor (§4.4) once this step is confirmed to count against that
    /// budget, independent of whether the program under test transitioned any monitor this step.
    ///
    /// Blocks (bounded by `deadlock_timeout`) when the enabled set is currently empty but the
    /// iteration hasn't fully completed, to give in-flight async work a chance to unblock an
    /// operation.
    pub async fn schedule_point(
        &self,
        current: OperationId,
        point: SchedulingPointKind,
    ) -> Result<OperationId> {
        let span = debug_span!("schedule_point", op = %current, point = %point);
        let _enter = span.enter();

        if self.cancellation.is_cancelled() {
            return Err(SchedulerError::Cancelled);
        }

        let steps_so_far = self.steps_taken.fetch_add(1, Ordering::SeqCst) + 1;
        if steps_so_far > self.fairness.max_fair_steps as u64 {
            return Err(SchedulerError::StepBudgetExceeded);
        }
        self.liveness.tick().await;

        let candidates = self.wait_for_enabled().await?;
        let current_seq = self.advance_sequence(current).await;

        // An empty candidate set means every operation is blocked or gone: there is nothing to
        // choose between, so leave `current` be rather than asking the strategy to index into an
        // empty slice. The caller (the test engine) is responsible for recognizing this as a
        // deadlock once the iteration ends.
        let next_op = if candidates.is_empty() {
            current
        } else {
            let mut strategy = self.strategy.lock().await;
            let chosen = strategy.next_operation(EnabledOperations {
                current,
                current_seq,
                point,
                candidates: &candidates,
            })?;
            drop(strategy);
            chosen
        };

        let next_seq = self.advance_sequence(next_op).await;
        let decision = SchedulingDecision::Operation {
            current_op: current,
            current_seq,
            point,
            next_op,
            next_seq,
        };
        debug!(decision = %decision, "scheduling decision");
        self.trace.lock().await.push(TraceEntry::from(decision));
        Ok(next_op)
    }

    pub async fn next_boolean(&self, current: OperationId) -> Result<bool> {
        let current_seq = self.advance_sequence(current).await;
        let mut strategy = self.strategy.lock().await;
        let value = strategy.next_boolean(current, current_seq)?;
        drop(strategy);
        self.trace.lock().await.push(TraceEntry::from(SchedulingDecision::Boolean {
            current_op: current,
            current_seq,
            value,
        }));
        Ok(value)
    }

    pub async fn next_integer(&self, current: OperationId, max_value: u64) -> Result<u64> {
        let current_seq = self.advance_sequence(current).await;
        let mut strategy = self.strategy.lock().await;
        let value = strategy.next_integer(current, current_seq, max_value)?;
        drop(strategy);
        self.trace.lock().await.push(TraceEntry::from(SchedulingDecision::Integer {
            current_op: current,
            current_seq,
            value,
        }));
        Ok(value)
    }

    /// Validates a send's safety metadata against the current inbox state before it's queued.
    /// Returns an error for a send that would push the same-type count above `assert_at_most`.
    pub fn check_send_safety(&self, event: &Event, post_send_same_type_count: u32) -> Result<()> {
        if let Some(bound) = event.metadata.assert_at_most {
            if post_send_same_type_count > bound {
                return Err(SchedulerError::SafetyViolation(format!(
                    "more than {bound} pending `{}` events in one inbox",
                    event.event_type
                )));
            }
        }
        Ok(())
    }

    async fn wait_for_enabled(&self) -> Result<Vec<OperationId>> {
        loop {
            let candidates = self.registry.enabled().await;
            if !candidates.is_empty() {
                return Ok(candidates);
            }
            if self.registry.all_completed().await {
                return Ok(Vec::new());
            }

            let wait = timeout(self.deadlock_timeout, self.registry.wait_for_change());
            if wait.await.is_err() {
                warn!("no operation became enabled within the deadlock timeout");
                return Ok(Vec::new());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::random::RandomStrategy;
    use arbiter_contracts::actor::ActorTransition;
    use arbiter_model::EventAction;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    fn new_core(strategy: Box<dyn ExplorationStrategy + Send>, deadlock_timeout: Duration) -> SchedulerCore {
        SchedulerCore::new(
            IterationId(0),
            1,
            strategy,
            deadlock_timeout,
            Arc::new(LivenessMonitorSet::new(50)),
            FairnessConfig::default(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn cancellation_ends_the_next_scheduling_point_as_cancelled() {
        let core = new_core(Box::new(RandomStrategy::new(1)), Duration::from_millis(50));
        let op = core.create_operation(OperationKind::Task, "a").await;
        core.cancellation.cancel();

        let err = core
            .schedule_point(op, SchedulingPointKind::OnYield)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Cancelled));
    }

    #[tokio::test]
    async fn schedule_point_records_a_decision_in_the_trace() {
        let core = new_core(Box::new(RandomStrategy::new(1)), Duration::from_millis(50));
        let op_a = core.create_operation(OperationKind::Task, "a").await;
        let op_b = core.create_operation(OperationKind::Task, "b").await;

        let chosen = core.schedule_point(op_a, SchedulingPointKind::OnYield).await.unwrap();
        assert!(chosen == op_a || chosen == op_b);

        let trace = core.take_trace().await;
        assert_eq!(trace.len(), 1);
    }

    #[tokio::test]
    async fn empty_registry_resolves_to_no_candidates() {
        let core = new_core(Box::new(RandomStrategy::new(1)), Duration::from_millis(20));
        let candidates = core.wait_for_enabled().await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn exceeding_the_step_budget_ends_the_iteration_with_step_budget_exceeded() {
        let mut core = new_core(Box::new(RandomStrategy::new(1)), Duration::from_millis(50));
        core.fairness.max_fair_steps = 2;
        let op = core.create_operation(OperationKind::Task, "a").await;

        core.schedule_point(op, SchedulingPointKind::OnYield).await.unwrap();
        core.schedule_point(op, SchedulingPointKind::OnYield).await.unwrap();
        let err = core
            .schedule_point(op, SchedulingPointKind::OnYield)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::StepBudgetExceeded));
    }

    struct Echo(Arc<AtomicUsize>);

    #[async_trait]
    impl ActorBehavior for Echo {
        fn initial_state(&self) -> String {
            "open".to_string()
        }

        fn classify(&self, _state: &str, _event: &Event) -> EventAction {
            EventAction::Handle
        }

        async fn handle(&mut self, _state: &str, _event: Event) -> ActorTransition {
            self.0.fetch_add(1, Ordering::SeqCst);
            ActorTransition::Stay
        }
    }

    #[tokio::test]
    async fn send_wakes_a_blocked_actor_and_receive_dispatches_it() {
        let core = new_core(Box::new(RandomStrategy::new(1)), Duration::from_millis(50));
        let sender = core.create_operation(OperationKind::Task, "sender").await;
        let handled = Arc::new(AtomicUsize::new(0));
        let actor = core.create_actor(Box::new(Echo(handled.clone())), "echo").await;

        assert!(!core.registry().get(actor).await.unwrap().status.is_enabled());

        core.send(sender, actor, Event::new("ping", serde_json::Value::Null, sender, "n/a"))
            .await
            .unwrap();
        core.receive(actor).await.unwrap();

        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn raise_dispatches_synchronously_ahead_of_a_deferring_queue() {
        let core = new_core(Box::new(RandomStrategy::new(1)), Duration::from_millis(50));
        let handled = Arc::new(AtomicUsize::new(0));
        let actor = core.create_actor(Box::new(Echo(handled.clone())), "echo").await;

        let action = core
            .raise(actor, Event::new("urgent", serde_json::Value::Null, actor, "n/a"))
            .await
            .unwrap();
        assert_eq!(action, Some(EventAction::Handle));
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }
}
