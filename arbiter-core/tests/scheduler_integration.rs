//! End-to-end coverage of the scheduler core through [`TestEngine`], independent of any particular
//! program under test: each test here is a minimal [`TestTarget`] chosen to exercise one guarantee
//! the engine is supposed to provide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arbiter_config::Configuration;
use arbiter_contracts::actor::{ActorBehavior, ActorTransition};
use arbiter_core::liveness::MonitorDefinition;
use arbiter_core::{Result, SchedulerCore, SchedulerError, TestEngine, TestTarget};
use arbiter_model::{Event, EventAction, MonitorId, OperationKind, SchedulingPointKind, SendMetadata, StrategyKind};
use async_trait::async_trait;

struct UnguardedIncrement {
    counter: Arc<AtomicU64>,
}

#[async_trait]
impl TestTarget for UnguardedIncrement {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let op_a = core.create_operation(OperationKind::Task, "a").await;
        let op_b = core.create_operation(OperationKind::Task, "b").await;

        let mut before = Vec::new();
        for op in [op_a, op_b] {
            let value = self.counter.load(Ordering::SeqCst);
            core.schedule_point(op, SchedulingPointKind::InterleaveMemoryAccess)
                .await?;
            self.counter.store(value + 1, Ordering::SeqCst);
            before.push(value);
        }

        if before[0] == before[1] {
            return Err(SchedulerError::SafetyViolation(
                "lost update: both operations read the same value".to_string(),
            ));
        }
        Ok(())
    }
}

#[tokio::test]
async fn iterations_run_to_the_configured_budget_when_nothing_fails() {
    let config = Configuration {
        testing_iterations: 20,
        fail_fast: false,
        ..Configuration::default()
    };
    let engine = TestEngine::new(
        config,
        UnguardedIncrement {
            counter: Arc::new(AtomicU64::new(0)),
        },
    );
    let report = engine.run().await;
    assert_eq!(report.iterations_run, 20);
}

struct StarvingMonitorTarget;

#[async_trait]
impl TestTarget for StarvingMonitorTarget {
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

        for _ in 0..100 {
            core.liveness().transition(monitor, "waiting").await?;
            core.schedule_point(op, SchedulingPointKind::OnYield).await?;
        }
        core.schedule_point(op, SchedulingPointKind::OnCompleted).await?;
        Ok(())
    }
}

#[tokio::test]
async fn a_monitor_stuck_hot_is_reported_as_a_liveness_violation() {
    let config = Configuration {
        testing_iterations: 1,
        fail_fast: false,
        ..Configuration::default()
    };
    let engine = TestEngine::new(config, StarvingMonitorTarget);
    let report = engine.run().await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.iterations_run, 1);
}

struct MutualExclusionTarget {
    counter: Arc<AtomicU64>,
    lock: Arc<tokio::sync::Mutex<()>>,
}

#[async_trait]
impl TestTarget for MutualExclusionTarget {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let op_a = core.create_operation(OperationKind::Task, "a").await;
        let op_b = core.create_operation(OperationKind::Task, "b").await;

        let mut before = Vec::new();
        for op in [op_a, op_b] {
            let guard = self.lock.lock().await;
            let value = self.counter.load(Ordering::SeqCst);
            core.schedule_point(op, SchedulingPointKind::InterleaveMemoryAccess)
                .await?;
            self.counter.store(value + 1, Ordering::SeqCst);
            before.push(value);
            drop(guard);
        }

        if before[0] == before[1] {
            return Err(SchedulerError::SafetyViolation(
                "lost update under a held lock should be impossible".to_string(),
            ));
        }
        Ok(())
    }
}

#[tokio::test]
async fn a_properly_guarded_critical_section_never_fails_regardless_of_schedule() {
    let config = Configuration {
        testing_iterations: 50,
        random_seed: 7,
        fail_fast: false,
        ..Configuration::default()
    };
    let engine = TestEngine::new(
        config,
        MutualExclusionTarget {
            counter: Arc::new(AtomicU64::new(0)),
            lock: Arc::new(tokio::sync::Mutex::new(())),
        },
    );
    let report = engine.run().await;
    assert!(report.is_clean(), "{report}");
}

struct DeadlockTarget;

#[async_trait]
impl TestTarget for DeadlockTarget {
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
        core.schedule_point(op_a, SchedulingPointKind::OnReceiveBlocking)
            .await?;
        Ok(())
    }
}

#[tokio::test]
async fn a_true_deadlock_is_inconclusive_not_a_failure() {
    let mut config = Configuration {
        testing_iterations: 1,
        fail_fast: false,
        ..Configuration::default()
    };
    config.liveness.deadlock_timeout = std::time::Duration::from_millis(50);

    let engine = TestEngine::new(config, DeadlockTarget);
    let report = engine.run().await;
    assert_eq!(report.inconclusive, 1);
    assert_eq!(report.failed, 0);
}

struct RecordsTraceLength {
    steps: u32,
}

#[async_trait]
impl TestTarget for RecordsTraceLength {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let op = core.create_operation(OperationKind::Task, "chooser").await;
        for _ in 0..self.steps {
            core.next_boolean(op).await?;
        }
        core.schedule_point(op, SchedulingPointKind::OnCompleted).await?;
        Ok(())
    }
}

#[tokio::test]
async fn two_runs_with_the_same_seed_make_identical_choices() {
    let config = Configuration {
        strategy: StrategyKind::Random,
        random_seed: 99,
        testing_iterations: 1,
        fail_fast: false,
        ..Configuration::default()
    };

    let first = TestEngine::new(config.clone(), RecordsTraceLength { steps: 8 })
        .run()
        .await;
    let second = TestEngine::new(config, RecordsTraceLength { steps: 8 })
        .run()
        .await;

    assert_eq!(first.iterations_run, second.iterations_run);
    assert!(first.is_clean());
    assert!(second.is_clean());
}

struct CountingActor {
    handled: Arc<AtomicU64>,
}

#[async_trait]
impl ActorBehavior for CountingActor {
    fn initial_state(&self) -> String {
        "open".to_string()
    }

    fn classify(&self, _state: &str, event: &Event) -> EventAction {
        if event.event_type.0 == "stop" {
            EventAction::Halt
        } else {
            EventAction::Handle
        }
    }

    async fn handle(&mut self, _state: &str, _event: Event) -> ActorTransition {
        self.handled.fetch_add(1, Ordering::SeqCst);
        ActorTransition::Stay
    }
}

struct ActorPingPongTarget {
    handled: Arc<AtomicU64>,
}

#[async_trait]
impl TestTarget for ActorPingPongTarget {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let sender = core.create_operation(OperationKind::Task, "sender").await;
        let actor = core
            .create_actor(Box::new(CountingActor { handled: self.handled.clone() }), "counter")
            .await;

        for _ in 0..3 {
            core.send(
                sender,
                actor,
                Event::new("ping", serde_json::Value::Null, sender, "n/a"),
            )
            .await?;
            core.receive(actor).await?;
        }

        core.send(sender, actor, Event::new("stop", serde_json::Value::Null, sender, "n/a"))
            .await?;
        core.receive(actor).await?;
        core.schedule_point(sender, SchedulingPointKind::OnCompleted).await?;
        Ok(())
    }
}

#[tokio::test]
async fn an_actor_driven_through_send_and_receive_handles_every_ping() {
    let config = Configuration {
        testing_iterations: 1,
        fail_fast: false,
        ..Configuration::default()
    };
    let handled = Arc::new(AtomicU64::new(0));
    let engine = TestEngine::new(config, ActorPingPongTarget { handled: handled.clone() });
    let report = engine.run().await;

    assert!(report.is_clean(), "{report}");
    assert_eq!(handled.load(Ordering::SeqCst), 3);
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

struct MustHandleViolationTarget;

#[async_trait]
impl TestTarget for MustHandleViolationTarget {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let sender = core.create_operation(OperationKind::Task, "sender").await;
        let strict = core.create_actor(Box::new(AlwaysIgnore), "strict").await;

        let urgent = Event::new("urgent", serde_json::Value::Null, sender, "n/a").with_metadata(SendMetadata {
            must_handle: true,
            ..Default::default()
        });
        core.send(sender, strict, urgent).await?;
        core.receive(strict).await?;
        Ok(())
    }
}

#[tokio::test]
async fn a_must_handle_event_classified_ignore_fails_the_iteration() {
    let config = Configuration {
        testing_iterations: 1,
        fail_fast: false,
        ..Configuration::default()
    };
    let engine = TestEngine::new(config, MustHandleViolationTarget);
    let report = engine.run().await;
    assert_eq!(report.failed, 1);
}

struct SingleStepTarget;

#[async_trait]
impl TestTarget for SingleStepTarget {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()> {
        let op = core.create_operation(OperationKind::Task, "a").await;
        loop {
            core.schedule_point(op, SchedulingPointKind::OnYield).await?;
        }
    }
}

#[tokio::test]
async fn exceeding_the_fairness_step_budget_is_inconclusive_not_a_failure() {
    let mut config = Configuration {
        testing_iterations: 1,
        fail_fast: false,
        ..Configuration::default()
    };
    config.fairness.max_fair_steps = 10;

    let engine = TestEngine::new(config, SingleStepTarget);
    let report = engine.run().await;
    assert_eq!(report.inconclusive, 1);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn cancelling_the_engine_stops_the_run_as_inconclusive() {
    let config = Configuration {
        testing_iterations: 50,
        fail_fast: false,
        ..Configuration::default()
    };
    let engine = Arc::new(TestEngine::new(config, SingleStepTarget));
    let watcher = engine.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        watcher.cancel();
    });

    let report = engine.run().await;
    assert!(report.iterations_run < 50);
    assert_eq!(report.failed, 0);
}
