//! Trait surfaces that describe interactions with the arbiter scheduling core: the pluggable
//! decision contract, the actor behavior contract, and the instrumentation callback contract.

pub mod actor;
pub mod callbacks;
pub mod strategy;

/// Frequently used trait combinators for the engine and runner crates.
pub mod prelude {
    pub use super::actor::{ActorBehavior, ActorTransition};
    pub use super::callbacks::{NullCallbacks, SchedulerCallbacks};
    pub use super::strategy::{EnabledOperations, ExplorationStrategy, FairnessHint};
}
