//! Command-line driver for the arbiter scheduler core.
//!
//! Picks a scenario out of the fixed registry, builds a [`Configuration`] from CLI flags, drives
//! it through a [`TestEngine`], and prints the resulting [`TestReport`] as JSON.

mod scenarios;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use arbiter_config::Configuration;
use arbiter_core::TestEngine;
use arbiter_model::StrategyKind;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "arbiter", about = "Run a scenario through the arbiter scheduler core")]
struct Cli {
    /// Scenario to run. See `--list` for the available names.
    scenario: Option<String>,

    /// List the available scenarios and exit.
    #[arg(long)]
    list: bool,

    /// Exploration strategy to drive scheduling decisions with.
    #[arg(long, value_enum, default_value = "random")]
    strategy: StrategyArg,

    /// Seed for the run's random number generator.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of testing iterations to run.
    #[arg(long, default_value_t = 1_000)]
    iterations: u64,

    /// Keep running the full iteration budget even after a failing iteration.
    #[arg(long)]
    no_fail_fast: bool,

    /// Wall-clock budget per iteration before a lack of progress is reported as a deadlock,
    /// in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    deadlock_timeout_ms: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Random,
    ProbabilisticRandom,
    PriorityBasedBounded,
    DepthFirst,
}

impl From<StrategyArg> for StrategyKind {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Random => StrategyKind::Random,
            StrategyArg::ProbabilisticRandom => StrategyKind::ProbabilisticRandom,
            StrategyArg::PriorityBasedBounded => StrategyKind::PriorityBasedBounded,
            StrategyArg::DepthFirst => StrategyKind::DepthFirst,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arbiter_core=info,arbiter_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let registry = scenarios::registry();

    if cli.list {
        for (name, _) in &registry {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(scenario_name) = cli.scenario else {
        bail!("no scenario given; pass a scenario name or --list to see the options");
    };

    let (_, target) = registry
        .into_iter()
        .find(|(name, _)| *name == scenario_name)
        .with_context(|| format!("unknown scenario `{scenario_name}`; run with --list"))?;

    let mut config = Configuration {
        strategy: cli.strategy.into(),
        random_seed: cli.seed,
        testing_iterations: cli.iterations,
        fail_fast: !cli.no_fail_fast,
        ..Configuration::default()
    };
    config.liveness.deadlock_timeout = Duration::from_millis(cli.deadlock_timeout_ms);

    info!(scenario = %scenario_name, strategy = %config.strategy, iterations = config.testing_iterations, "starting run");

    let engine = Arc::new(TestEngine::new(config, RunnerTarget(target)));
    let ctrl_c_engine = engine.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, finishing the current iteration then stopping");
            ctrl_c_engine.cancel();
        }
    });

    let report = engine.run().await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    info!(%report, "run finished");

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

/// Adapts the boxed scenario trait object into a concrete [`arbiter_core::TestTarget`] so
/// `TestEngine` doesn't need to know scenarios are stored behind a `Box<dyn _>`.
struct RunnerTarget(Box<dyn arbiter_core::TestTarget>);

#[async_trait::async_trait]
impl arbiter_core::TestTarget for RunnerTarget {
    async fn run(&self, core: std::sync::Arc<arbiter_core::SchedulerCore>) -> arbiter_core::Result<()> {
        self.0.run(core).await
    }
}
