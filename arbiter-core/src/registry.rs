use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tracing::debug;

use arbiter_model::{Operation, OperationId, OperationKind, OperationStatus};

use crate::error::{Result, SchedulerError};

/// Arena for every controlled operation alive in the current testing iteration.
///
/// Mirrors the single-writer-guard shape used across the codebase for shared mutable state: one
/// `tokio::sync::Mutex` around the map, plus a `Notify` so callers can wait for a status change
/// (used by the scheduler core when every operation is currently blocked) instead of busy-polling.
#[derive(Clone, Debug, Default)]
pub struct OperationRegistry {
    inner: Arc<Mutex<HashMap<OperationId, Operation>>>,
    changed: Arc<Notify>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the registry to empty, ready for a new iteration. `OperationId`s from the previous
    /// iteration must never be reused afterwards.
    pub async fn reset(&self) {
        let mut guard = self.inner.lock().await;
        guard.clear();
    }

    pub async fn spawn(&self, id: OperationId, kind: OperationKind, description: impl Into<String>) {
        let op = Operation::new(id, kind, description);
        debug!(op = %op, "operation spawned");
        let mut guard = self.inner.lock().await;
        guard.insert(id, op);
    }

    pub async fn set_status(&self, id: OperationId, status: OperationStatus) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let op = guard
            .get_mut(&id)
            .ok_or(SchedulerError::UnknownOperation(id))?;
        op.status = status;
        drop(guard);
        self.changed.notify_waiters();
        Ok(())
    }

    pub async fn set_callsite(&self, id: OperationId, callsite: impl Into<String>) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let op = guard
            .get_mut(&id)
            .ok_or(SchedulerError::UnknownOperation(id))?;
        op.last_callsite = Some(callsite.into());
        Ok(())
    }

    pub async fn get(&self, id: OperationId) -> Result<Operation> {
        let guard = self.inner.lock().await;
        guard
            .get(&id)
            .cloned()
            .ok_or(SchedulerError::UnknownOperation(id))
    }

    /// All operations currently in [`OperationStatus::Enabled`], in id order so strategies see a
    /// deterministic candidate list for a given seed.
    pub async fn enabled(&self) -> Vec<OperationId> {
        let guard = self.inner.lock().await;
        let mut ids: Vec<OperationId> = guard
            .values()
            .filter(|op| op.status.is_enabled())
            .map(|op| op.id)
            .collect();
        ids.sort();
        ids
    }

    pub async fn all_completed(&self) -> bool {
        let guard = self.inner.lock().await;
        guard.values().all(|op| op.status.is_completed())
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Blocks until some operation's status changes, used when the enabled set is empty but not
    /// every operation has completed (a potential deadlock, resolved by the caller's timeout).
    pub async fn wait_for_change(&self) {
        self.changed.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enabled_returns_only_enabled_operations_sorted() {
        let registry = OperationRegistry::new();
        registry
            .spawn(OperationId(2), OperationKind::Task, "b")
            .await;
        registry
            .spawn(OperationId(1), OperationKind::Task, "a")
            .await;
        registry
            .set_status(OperationId(2), OperationStatus::Enabled)
            .await
            .unwrap();
        registry
            .set_status(OperationId(1), OperationStatus::Enabled)
            .await
            .unwrap();

        assert_eq!(registry.enabled().await, vec![OperationId(1), OperationId(2)]);
    }

    #[tokio::test]
    async fn set_status_on_unknown_operation_errors() {
        let registry = OperationRegistry::new();
        let err = registry
            .set_status(OperationId(9), OperationStatus::Enabled)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownOperation(_)));
    }

    #[tokio::test]
    async fn reset_clears_all_operations() {
        let registry = OperationRegistry::new();
        registry
            .spawn(OperationId(1), OperationKind::Task, "a")
            .await;
        registry.reset().await;
        assert_eq!(registry.len().await, 0);
    }
}
