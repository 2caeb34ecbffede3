use std::fmt;

/// Monotonic identifier for a controlled operation, unique within one testing iteration.
///
/// `OperationId`s are never reused across iterations: the registry is rebuilt from scratch at the
/// start of every iteration, so identity never has to survive a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationId(pub u64);

impl OperationId {
    /// The identifier reserved for the implicit root operation of an iteration.
    pub const ROOT: OperationId = OperationId(0);

    /// Returns the next identifier in sequence.
    pub fn next(self) -> Self {
        OperationId(self.0 + 1)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-operation event counter, incremented on every scheduling point the operation reaches.
///
/// Paired with an [`OperationId`] this gives the `(op_id, sequence_id)` coordinate that traces and
/// replay use to assert they are looking at the same decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceId(pub u64);

impl SequenceId {
    /// Increments the counter in place and returns the new value.
    pub fn advance(&mut self) -> Self {
        self.0 += 1;
        *self
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a liveness monitor instance. Monitors share the operation id-space for uniqueness but
/// are never part of the enabled set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonitorId(pub u64);

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier for a single testing iteration, used to correlate trace and report entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationId(pub u64);

impl fmt::Display for IterationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
