//! Shared liveness monitor vocabulary: state temperature classification and violation reports.

use std::fmt;

use crate::ids::MonitorId;

/// How a liveness monitor state is classified for the hot/cold temperature rule in `§4.4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateTemperature {
    /// Must eventually be left; temperature ticks up while the monitor stays here.
    Hot,
    /// Liveness-satisfying rest state; entering it resets temperature to zero.
    Cold,
    /// Neither hot nor cold: temperature is left unchanged.
    Neutral,
}

impl fmt::Display for StateTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateTemperature::Hot => write!(f, "hot"),
            StateTemperature::Cold => write!(f, "cold"),
            StateTemperature::Neutral => write!(f, "neutral"),
        }
    }
}

/// A liveness violation as reported by the monitor, carrying enough context to dedupe by message.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LivenessViolation {
    pub monitor_id: MonitorId,
    pub monitor_name: String,
    pub state_name: String,
    pub message: String,
}

impl LivenessViolation {
    /// A temperature-threshold violation, with the standard message text from the spec.
    pub fn temperature_exceeded(
        monitor_id: MonitorId,
        monitor_name: impl Into<String>,
        state_name: impl Into<String>,
    ) -> Self {
        let state_name = state_name.into();
        Self {
            monitor_id,
            monitor_name: monitor_name.into(),
            message: format!("detected potential liveness bug in hot state {state_name}"),
            state_name,
        }
    }

    /// A cycle-based violation: the global state hash repeated while a monitor was hot.
    pub fn cycle_detected(
        monitor_id: MonitorId,
        monitor_name: impl Into<String>,
        state_name: impl Into<String>,
    ) -> Self {
        Self {
            monitor_id,
            monitor_name: monitor_name.into(),
            state_name: state_name.into(),
            message: "infinite execution that violates a liveness property".to_string(),
        }
    }
}

impl fmt::Display for LivenessViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
