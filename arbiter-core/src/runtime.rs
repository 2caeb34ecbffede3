use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug_span, info, warn};

use arbiter_config::Configuration;
use arbiter_contracts::callbacks::{NullCallbacks, SchedulerCallbacks};
use arbiter_model::{IterationId, IterationOutcome, IterationRecord, TestReport};

use crate::error::{Result, SchedulerError};
use crate::event_bus::{DecisionBus, EngineEvent};
use crate::liveness::LivenessMonitorSet;
use crate::scheduler_core::SchedulerCore;
use crate::strategy;

/// A program under test: whatever user code drives operations through a [`SchedulerCore`] for one
/// iteration. The engine constructs a fresh core per iteration and hands it to `run`.
#[async_trait]
pub trait TestTarget: Send + Sync {
    async fn run(&self, core: Arc<SchedulerCore>) -> Result<()>;
}

/// Drives the configured number of testing iterations against a [`TestTarget`], rotating
/// exploration strategies, checking liveness monitors, and folding the outcome of every iteration
/// into a [`TestReport`].
///
/// Generic over the target and the callback sink, the same way `OrchestratorRuntime` is generic
/// over its queue/event/budget collaborators; the manual [`fmt::Debug`] impl reports their type
/// names instead of requiring them to implement `Debug` themselves.
pub struct TestEngine<T, C = NullCallbacks>
where
    T: TestTarget + 'static,
    C: SchedulerCallbacks + 'static,
{
    config: Configuration,
    target: Arc<T>,
    callbacks: Arc<C>,
    events: Arc<DecisionBus>,
    cancellation: CancellationToken,
}

impl<T, C> fmt::Debug for TestEngine<T, C>
where
    T: TestTarget + 'static,
    C: SchedulerCallbacks + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestEngine")
            .field("target_type", &type_name::<T>())
            .field("callbacks_type", &type_name::<C>())
            .field("testing_iterations", &self.config.testing_iterations)
            .field("strategy", &self.config.strategy.to_string())
            .finish()
    }
}

impl<T> TestEngine<T, NullCallbacks>
where
    T: TestTarget + 'static,
{
    pub fn new(config: Configuration, target: T) -> Self {
        Self {
            config,
            target: Arc::new(target),
            callbacks: Arc::new(NullCallbacks),
            events: Arc::new(DecisionBus::default()),
            cancellation: CancellationToken::new(),
        }
    }
}

impl<T, C> TestEngine<T, C>
where
    T: TestTarget + 'static,
    C: SchedulerCallbacks + 'static,
{
    pub fn with_callbacks(config: Configuration, target: T, callbacks: C) -> Self {
        Self {
            config,
            target: Arc::new(target),
            callbacks: Arc::new(callbacks),
            events: Arc::new(DecisionBus::default()),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn events(&self) -> Arc<DecisionBus> {
        self.events.clone()
    }

    /// A cloned handle to this engine's cancellation token. Triggering it (e.g. from a Ctrl-C
    /// handler) ends the iteration in flight as [`IterationOutcome::Inconclusive`] and stops the
    /// run before starting another one, without corrupting whatever report has accumulated so far.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Requests that the run stop as soon as the current iteration reaches its next scheduling
    /// point.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Runs the configured number of iterations, stopping early if `fail_fast` is set and an
    /// iteration fails, or if [`Self::cancel`] is called from another task.
    pub async fn run(&self) -> TestReport {
        let mut report = TestReport::default();

        for i in 0..self.config.testing_iterations {
            if self.cancellation.is_cancelled() {
                warn!(iteration = i, "stopping early: cancellation requested");
                break;
            }

            let liveness = Arc::new(LivenessMonitorSet::new(
                self.config.liveness.temperature_threshold,
            ));
            let iteration = IterationId(i);
            let strategy_kind = if self.config.is_portfolio_mode() {
                self.config
                    .portfolio
                    .strategy_for_iteration(i)
                    .cloned()
                    .unwrap_or_else(|| self.config.strategy.clone())
            } else {
                self.config.strategy.clone()
            };

            let span = debug_span!("iteration", iteration = i);
            let _enter = span.enter();

            self.callbacks.on_iteration_start(iteration);
            self.events.publish(EngineEvent::IterationStarted(iteration));

            let strategy_impl = strategy::build(
                &strategy_kind,
                self.config.random_seed,
                self.config.strategy_bound,
                self.config.fairness,
                None,
            );
            let core = Arc::new(SchedulerCore::new(
                iteration,
                self.config.random_seed,
                strategy_impl,
                self.config.liveness.deadlock_timeout,
                liveness.clone(),
                self.config.fairness,
                self.cancellation.child_token(),
            ));

            let run_result = self.target.run(core.clone()).await;
            let trace = core.take_trace().await;

            let outcome = match run_result {
                Err(SchedulerError::StepBudgetExceeded) => IterationOutcome::Inconclusive {
                    reason: "iteration exceeded its step budget".to_string(),
                },
                Err(SchedulerError::InconclusiveAssumption(reason)) => {
                    IterationOutcome::Inconclusive { reason }
                }
                Err(SchedulerError::Cancelled) => IterationOutcome::Inconclusive {
                    reason: "iteration cancelled".to_string(),
                },
                Err(err) => IterationOutcome::Failed {
                    message: err.to_string(),
                },
                Ok(()) => {
                    let violations = liveness.check_temperatures().await;
                    match violations.into_iter().next() {
                        Some(violation) => {
                            self.callbacks.on_liveness_violation(iteration, &violation);
                            IterationOutcome::LivenessViolated(violation)
                        }
                        None if !core.registry().all_completed().await => {
                            IterationOutcome::Inconclusive {
                                reason: "deadlock timeout with operations still pending"
                                    .to_string(),
                            }
                        }
                        None => IterationOutcome::Passed,
                    }
                }
            };

            self.callbacks.on_iteration_end(iteration, &outcome);
            self.events.publish(EngineEvent::IterationFinished {
                iteration,
                outcome: outcome.clone(),
            });

            let is_failure = outcome.is_failure();
            report.record(IterationRecord {
                iteration,
                outcome,
                trace,
                steps_explored: 0,
            });

            if is_failure && self.config.fail_fast {
                warn!(iteration = i, "stopping early: fail_fast is set");
                break;
            }
        }

        info!(%report, "test run complete");
        report
    }
}
