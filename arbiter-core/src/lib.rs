//! The scheduler core: operation registry, actor dispatch, exploration strategies, liveness
//! monitoring, and the test engine that drives iterations against a program under test.

pub mod actor;
pub mod error;
pub mod event_bus;
pub mod liveness;
pub mod registry;
pub mod runtime;
pub mod scheduler_core;
pub mod strategy;

pub use error::{Result, SchedulerError};
pub use event_bus::{DecisionBus, EngineEvent, EngineEventStream};
pub use liveness::{LivenessMonitorSet, MonitorDefinition};
pub use registry::OperationRegistry;
pub use runtime::{TestEngine, TestTarget};
pub use scheduler_core::SchedulerCore;
