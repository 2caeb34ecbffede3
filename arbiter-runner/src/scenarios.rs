//! Fixed scenario registry the runner exercises against the scheduler core. Each scenario is a
//! small program under test, written against [`SchedulerCore`] directly rather than through a real
//! async runtime: driving actual `tokio::spawn`'d tasks through the scheduler would need the
//! runtime itself instrumented, which is out of scope here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arbiter_contracts::actor::{ActorBehavior, ActorTransition};
use arbiter_core::liveness::MonitorDefinition;
use arbiter_core::{Result, SchedulerCore, SchedulerError, TestTarget};
use arbiter_model::{Event, EventAction, MonitorId, OperationKind, SchedulingPointKind, SendMetadata};
use async_trait::async_trait;

/// Two operations race to increment a shared counter guarded by a flag that is itself racy: the
/// scenario fails whenever the scheduler interleaves them so both read the same pre-increment
/// value. A correct mutual-exclusion implementation (guarded by an actual lock) would never fail
/// regardless of how the strategy interleaves the two operations.
pub struct RacyCounterScenario {
    pub use_lock: bool,
}

#[async_trait]
impl TestTarget for RacyCounterScenario {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let counter = Arc::new(AtomicU64::new(0));
        let lock = Arc::new(tokio::sync::Mutex::new(()));

        let op_a = core
            .create_operation(OperationKind::Task, "incrementer-a")
            .await;
        let op_b = core
            .create_operation(OperationKind::Task, "incrementer-b")
            .await;

        let mut seen = Vec::new();
        for op in [op_a, op_b] {
            core.schedule_point(op, SchedulingPointKind::OnCreate).await?;

            let _guard = if self.use_lock {
                Some(lock.lock().await)
            } else {
                None
            };

            let before = counter.load(Ordering::SeqCst);
            core.schedule_point(op, SchedulingPointKind::InterleaveMemoryAccess)
                .await?;
            counter.store(before + 1, Ordering::SeqCst);
            seen.push(before);

            drop(_guard);
            core.schedule_point(op, SchedulingPointKind::OnCompleted).await?;
        }

        if !self.use_lock && seen[0] == seen[1] {
            return Err(SchedulerError::SafetyViolation(
                "both operations observed the same pre-increment value".to_string(),
            ));
        }
        Ok(())
    }
}

/// Two operations each wait on the other's completion: a textbook deadlock. The scheduler's
/// deadlock timeout must resolve this as inconclusive rather than hanging the run.
pub struct MutualWaitScenario;

#[async_trait]
impl TestTarget for MutualWaitScenario {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let op_a = core.create_operation(OperationKind::Task, "waits-on-b").await;
        let op_b = core.create_operation(OperationKind::Task, "waits-on-a").await;

        core.registry()
            .set_status(
                op_a,
                arbiter_model::OperationStatus::Blocked(arbiter_model::BlockReason::WaitingOnCompletion(op_b)),
            )
            .await?;
        core.registry()
            .set_status(
                op_b,
                arbiter_model::OperationStatus::Blocked(arbiter_model::BlockReason::WaitingOnCompletion(op_a)),
            )
            .await?;

        // Neither operation is ever re-enabled: the scheduler core's wait_for_enabled path times
        // out and schedule_point below resolves to an empty candidate set.
        let _ = core.schedule_point(op_a, SchedulingPointKind::OnReceiveBlocking).await?;
        Ok(())
    }
}

/// A single operation makes a bounded number of nondeterministic choices; used to exercise replay
/// and the depth-first strategy's exhaustive coverage of small choice spaces.
pub struct BoundedChoiceScenario {
    pub choice_count: u32,
}

#[async_trait]
impl TestTarget for BoundedChoiceScenario {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let op = core.create_operation(OperationKind::Task, "chooser").await;
        for _ in 0..self.choice_count {
            let _ = core.next_boolean(op).await?;
        }
        core.schedule_point(op, SchedulingPointKind::OnCompleted).await?;
        Ok(())
    }
}

/// A single operation spins between `pending` and `waiting` without ever reaching `done`,
/// registered as a liveness monitor with `waiting` hot and `done` cold. Run long enough, this
/// should be reported as a liveness violation rather than passing just because no safety
/// assertion ever fired.
pub struct StarvingLoopScenario {
    pub spin_count: u32,
}

#[async_trait]
impl TestTarget for StarvingLoopScenario {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let op = core.create_operation(OperationKind::Task, "spinner").await;
        let monitor = MonitorId(1);
        core.liveness()
            .register(
                monitor,
                MonitorDefinition::new("progress")
                    .with_hot_state("waiting")
                    .with_cold_state("done"),
            )
            .await;

        for _ in 0..self.spin_count {
            core.liveness().transition(monitor, "waiting").await?;
            core.schedule_point(op, SchedulingPointKind::OnYield).await?;
        }

        core.schedule_point(op, SchedulingPointKind::OnCompleted).await?;
        Ok(())
    }
}

/// A mailbox actor that handles `ping` and halts on `stop`. One task sends it a bounded run of
/// pings followed by a stop and then drains it by receiving; exercises `create_actor`/`send`/
/// `receive` together with a `must_handle` ping and an `assert_at_most` bound on the inbox depth.
struct MailboxActor;

#[async_trait]
impl ActorBehavior for MailboxActor {
    fn initial_state(&self) -> String {
        "open".to_string()
    }

    fn classify(&self, state: &str, event: &Event) -> EventAction {
        match (state, event.event_type.0.as_str()) {
            (_, "stop") => EventAction::Halt,
            ("open", "ping") => EventAction::Handle,
            _ => EventAction::Ignore,
        }
    }

    async fn handle(&mut self, _state: &str, _event: Event) -> ActorTransition {
        ActorTransition::Stay
    }
}

pub struct ActorMailboxScenario {
    pub ping_count: u32,
}

#[async_trait]
impl TestTarget for ActorMailboxScenario {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let sender = core.create_operation(OperationKind::Task, "pinger").await;
        let actor = core.create_actor(Box::new(MailboxActor), "mailbox").await;

        for _ in 0..self.ping_count {
            let ping = Event::new("ping", serde_json::Value::Null, sender, "n/a").with_metadata(SendMetadata {
                must_handle: true,
                assert_at_most: Some(1),
                ..Default::default()
            });
            core.send(sender, actor, ping).await?;
            core.receive(actor).await?;
        }

        let stop = Event::new("stop", serde_json::Value::Null, sender, "n/a");
        core.send(sender, actor, stop).await?;
        core.receive(actor).await?;

        core.schedule_point(sender, SchedulingPointKind::OnCompleted).await?;
        Ok(())
    }
}

pub fn registry() -> Vec<(&'static str, Box<dyn TestTarget>)> {
    vec![
        (
            "racy-counter-unlocked",
            Box::new(RacyCounterScenario { use_lock: false }) as Box<dyn TestTarget>,
        ),
        (
            "racy-counter-locked",
            Box::new(RacyCounterScenario { use_lock: true }),
        ),
        ("mutual-wait", Box::new(MutualWaitScenario)),
        (
            "bounded-choice",
            Box::new(BoundedChoiceScenario { choice_count: 4 }),
        ),
        (
            "starving-loop",
            Box::new(StarvingLoopScenario { spin_count: 200 }),
        ),
        (
            "actor-mailbox",
            Box::new(ActorMailboxScenario { ping_count: 5 }),
        ),
    ]
}
