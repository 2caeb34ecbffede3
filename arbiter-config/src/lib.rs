//! Run configuration for the arbiter scheduling core: strategy selection, exploration bounds, and
//! liveness thresholds.
//!
//! Every field carries a default so a caller can start from [`Configuration::default`] and
//! override only the knobs it cares about, the same way `arbiter-core`'s orchestration layer is
//! configured.

use std::time::Duration;

use arbiter_model::{Portfolio, StrategyKind};

/// Top-level run configuration passed to the scheduler core when a test run starts.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Exploration strategy to drive scheduling decisions with.
    pub strategy: StrategyKind,
    /// Bound applied to the priority-based-bounded strategy's priority change budget per
    /// iteration. Ignored by strategies that don't use it.
    pub strategy_bound: StrategyBound,
    /// Seed for the run's random number generator. Persisted in the trace so a failing iteration
    /// can be reproduced exactly.
    pub random_seed: u64,
    /// Number of testing iterations to run before stopping, absent early exit from `fail_fast`.
    pub testing_iterations: u64,
    /// Stop at the first failing iteration instead of running the full budget.
    pub fail_fast: bool,
    /// Fairness budget controlling how many unfair (priority/depth-first) steps a fair-wrapped
    /// strategy may take before switching to round-robin, and the overall per-iteration step
    /// budget enforced independent of fairness.
    pub fairness: FairnessConfig,
    /// Liveness monitor tuning.
    pub liveness: LivenessConfig,
    /// When non-empty, iterations rotate through this fixed sequence of strategies instead of
    /// using `strategy` for every iteration.
    pub portfolio: Portfolio,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Random,
            strategy_bound: StrategyBound::default(),
            random_seed: 0,
            testing_iterations: 1_000,
            fail_fast: true,
            fairness: FairnessConfig::default(),
            liveness: LivenessConfig::default(),
            portfolio: Portfolio::default(),
        }
    }
}

impl Configuration {
    /// True when iterations should rotate strategies instead of using a single fixed one.
    pub fn is_portfolio_mode(&self) -> bool {
        !self.portfolio.is_empty()
    }
}

/// Step budget applied by the priority-based-bounded strategy to how many times it may reshuffle
/// priorities within a single iteration before falling back to the current order.
#[derive(Debug, Clone, Copy)]
pub struct StrategyBound {
    pub max_priority_switch_points: u32,
}

impl Default for StrategyBound {
    fn default() -> Self {
        Self {
            max_priority_switch_points: 3,
        }
    }
}

/// Fairness controls shared by the fair-wrapper strategy and any strategy that opts into being
/// inherently fair.
#[derive(Debug, Clone, Copy)]
pub struct FairnessConfig {
    /// Maximum consecutive unfair (strategy-chosen) steps before forcing round-robin for one
    /// operation.
    pub max_unfair_steps: u32,
    /// Maximum steps overall in a single iteration before the engine aborts it as inconclusive.
    pub max_fair_steps: u32,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            max_unfair_steps: 60,
            max_fair_steps: 10_000,
        }
    }
}

/// Liveness monitor thresholds.
#[derive(Debug, Clone, Copy)]
pub struct LivenessConfig {
    pub enabled: bool,
    /// Consecutive scheduling decisions a monitor may remain hot before a potential violation is
    /// reported.
    pub temperature_threshold: u32,
    /// Wall-clock budget per iteration before the engine treats a lack of progress as a deadlock
    /// rather than a slow-but-live execution.
    pub deadlock_timeout: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            temperature_threshold: 50,
            deadlock_timeout: Duration::from_secs(10),
        }
    }
}
