//! The enumerable strategy configuration surface, shared between `arbiter-config` (which builds a
//! [`StrategyKind`] from user-facing settings) and `arbiter-core` (which instantiates the matching
//! `ExplorationStrategy` implementation).

use std::fmt;

/// Which exploration strategy a test run uses. Corresponds 1:1 to the `strategy` configuration
/// option in `§3` of the specification.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrategyKind {
    Random,
    ProbabilisticRandom,
    PriorityBasedBounded,
    DepthFirst,
    /// Wraps another strategy, switching to round-robin once the unfair step budget is spent.
    FairWrapper(Box<StrategyKind>),
    /// Drives the scheduler from a previously recorded trace instead of deciding freshly.
    Replay,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Random => write!(f, "random"),
            StrategyKind::ProbabilisticRandom => write!(f, "probabilistic-random"),
            StrategyKind::PriorityBasedBounded => write!(f, "priority-based-bounded"),
            StrategyKind::DepthFirst => write!(f, "depth-first"),
            StrategyKind::FairWrapper(inner) => write!(f, "fair-wrapper({inner})"),
            StrategyKind::Replay => write!(f, "replay"),
        }
    }
}

impl StrategyKind {
    /// True for strategies that are fair on their own, without needing the fair wrapper.
    pub fn is_inherently_fair(&self) -> bool {
        matches!(
            self,
            StrategyKind::Random | StrategyKind::ProbabilisticRandom | StrategyKind::FairWrapper(_)
        )
    }
}

/// A fixed rotation of strategies used by portfolio mode; each iteration advances to the next
/// entry, wrapping around.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Portfolio(pub Vec<StrategyKind>);

impl Portfolio {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the strategy assigned to the given iteration index, wrapping around the portfolio.
    pub fn strategy_for_iteration(&self, iteration_index: u64) -> Option<&StrategyKind> {
        if self.0.is_empty() {
            return None;
        }
        let idx = (iteration_index as usize) % self.0.len();
        self.0.get(idx)
    }
}
