//! Exploration strategies: the pluggable scheduling-decision implementations behind
//! [`arbiter_contracts::strategy::ExplorationStrategy`].

pub mod depth_first;
pub mod fair_wrapper;
pub mod priority_bounded;
pub mod probabilistic;
pub mod random;
pub mod replay;

use arbiter_config::{FairnessConfig, StrategyBound};
use arbiter_contracts::strategy::ExplorationStrategy;
use arbiter_model::{ExecutionTrace, StrategyKind};

/// Builds the boxed strategy implementation for a configured [`StrategyKind`].
///
/// Centralizing construction here (rather than letting `StrategyKind` itself carry the
/// implementation) keeps `arbiter-model` free of the tokio/rand dependencies the strategies need.
pub fn build(
    kind: &StrategyKind,
    seed: u64,
    bound: StrategyBound,
    fairness: FairnessConfig,
    replay_trace: Option<ExecutionTrace>,
) -> Box<dyn ExplorationStrategy + Send> {
    match kind {
        StrategyKind::Random => Box::new(random::RandomStrategy::new(seed)),
        StrategyKind::ProbabilisticRandom => {
            Box::new(probabilistic::ProbabilisticRandomStrategy::new(seed))
        }
        StrategyKind::PriorityBasedBounded => Box::new(
            priority_bounded::PriorityBasedBoundedStrategy::new(seed, bound),
        ),
        StrategyKind::DepthFirst => Box::new(depth_first::DepthFirstStrategy::new()),
        StrategyKind::FairWrapper(inner) => Box::new(fair_wrapper::FairWrapperStrategy::new(
            build(inner, seed, bound, fairness, None),
            fairness.max_unfair_steps,
        )),
        StrategyKind::Replay => Box::new(replay::ReplayStrategy::new(
            replay_trace.unwrap_or_default(),
        )),
    }
}
