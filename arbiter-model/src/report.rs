//! The end-of-run test report: aggregate outcome counts plus the artifacts worth keeping.

use std::fmt;

use crate::ids::IterationId;
use crate::liveness::LivenessViolation;
use crate::trace::ExecutionTrace;

/// Outcome of a single testing iteration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IterationOutcome {
    /// Ran to completion with no assertion or liveness violation observed.
    Passed,
    /// A safety assertion (`assert_at_most`, a user assertion, or a `must_handle` violation) failed.
    Failed { message: String },
    /// A liveness monitor reported a violation.
    LivenessViolated(LivenessViolation),
    /// Pruned because the only remaining schedules would violate an `assume_at_most` bound, or
    /// because the deadlock timeout fired with no enabled operations. Not counted as a failure.
    Inconclusive { reason: String },
}

impl IterationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            IterationOutcome::Failed { .. } | IterationOutcome::LivenessViolated(_)
        )
    }
}

impl fmt::Display for IterationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IterationOutcome::Passed => write!(f, "passed"),
            IterationOutcome::Failed { message } => write!(f, "failed: {message}"),
            IterationOutcome::LivenessViolated(v) => write!(f, "liveness violated: {v}"),
            IterationOutcome::Inconclusive { reason } => write!(f, "inconclusive: {reason}"),
        }
    }
}

/// One iteration's recorded result: the outcome plus the trace that produced it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationRecord {
    pub iteration: IterationId,
    pub outcome: IterationOutcome,
    pub trace: ExecutionTrace,
    pub steps_explored: u64,
}

/// Aggregate result of a full testing run, built incrementally as iterations complete and merged
/// when a run is split across a portfolio or parallel workers.
///
/// `merge` is associative and commutative: running N iterations in one report and merging it with a
/// report built from a disjoint set of N iterations gives the same totals as running all 2N in one
/// report, regardless of merge order. This lets the runner fold per-worker reports without caring
/// about their ordering.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestReport {
    pub iterations_run: u64,
    pub passed: u64,
    pub failed: u64,
    pub inconclusive: u64,
    /// Failing and liveness-violating records are kept in full so the runner can emit their traces;
    /// passing records are dropped to keep long runs from growing the report unboundedly.
    pub failures: Vec<IterationRecord>,
}

impl TestReport {
    pub fn record(&mut self, record: IterationRecord) {
        self.iterations_run += 1;
        match &record.outcome {
            IterationOutcome::Passed => self.passed += 1,
            IterationOutcome::Inconclusive { .. } => self.inconclusive += 1,
            IterationOutcome::Failed { .. } | IterationOutcome::LivenessViolated(_) => {
                self.failed += 1;
                self.failures.push(record);
            }
        }
    }

    /// Combines two reports produced from disjoint iteration ranges into one.
    pub fn merge(mut self, other: TestReport) -> TestReport {
        self.iterations_run += other.iterations_run;
        self.passed += other.passed;
        self.failed += other.failed;
        self.inconclusive += other.inconclusive;
        self.failures.extend(other.failures);
        self
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} iterations: {} passed, {} failed, {} inconclusive",
            self.iterations_run, self.passed, self.failed, self.inconclusive
        )
    }
}
