//! Deletion use-case service
//!
//! Resolves the acting user, picks the single or bulk path and returns a
//! structured outcome. Turning an outcome into a user-facing notification
//! is left to the caller (see `commands::notify`).

use super::bulk::{BulkCoordinator, BulkDeleteResult, FailedItem};
use super::gateway::Gateway;
use crate::backend::{IdentityProvider, ProcedureCaller};
use crate::database::Operation;
use crate::error::{AppError, Result};
use crate::registry::EntityKind;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Restores a row straight after a single delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoAction {
    pub kind: EntityKind,
    pub id: String,
}

/// Result of one delete or restore request
#[derive(Debug, Clone, Serialize)]
pub struct DeletionOutcome {
    pub operation: Operation,
    pub kind: EntityKind,
    /// Number of ids in the request, duplicates included
    pub requested: usize,
    pub result: BulkDeleteResult,
}

impl DeletionOutcome {
    /// True only when every requested id succeeded
    pub fn all_succeeded(&self) -> bool {
        self.result.successful.len() == self.requested
    }

    pub fn succeeded(&self) -> usize {
        self.result.successful.len()
    }

    pub fn first_failure(&self) -> Option<&FailedItem> {
        self.result.first_failure()
    }

    /// Undo handle for a successful single-row soft delete
    pub fn undo_action(&self) -> Option<UndoAction> {
        match (self.operation, self.result.successful.as_slice()) {
            (Operation::SoftDelete, [id]) if self.requested == 1 => Some(UndoAction {
                kind: self.kind,
                id: id.clone(),
            }),
            _ => None,
        }
    }
}

/// Decrements the in-flight counter when dropped
struct LoadingGuard(Arc<AtomicUsize>);

impl LoadingGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Service for deleting and restoring rows on behalf of the signed-in user
#[derive(Clone)]
pub struct DeletionService {
    gateway: Gateway,
    bulk: BulkCoordinator,
    identity: Arc<dyn IdentityProvider>,
    in_flight: Arc<AtomicUsize>,
}

impl DeletionService {
    pub fn new(caller: Arc<dyn ProcedureCaller>, identity: Arc<dyn IdentityProvider>) -> Self {
        let gateway = Gateway::new(caller);
        Self {
            bulk: BulkCoordinator::new(gateway.clone()),
            gateway,
            identity,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Move rows of one kind to the trash
    pub async fn soft_delete(&self, ids: &[String], kind: EntityKind) -> Result<DeletionOutcome> {
        self.execute(Operation::SoftDelete, ids, kind).await
    }

    /// Restore rows of one kind from the trash
    pub async fn restore(&self, ids: &[String], kind: EntityKind) -> Result<DeletionOutcome> {
        self.execute(Operation::Restore, ids, kind).await
    }

    /// Run the undo action attached to a single-delete notification
    pub async fn undo(&self, action: &UndoAction) -> Result<DeletionOutcome> {
        tracing::info!("Undoing delete of {} {}", action.kind, action.id);
        self.restore(std::slice::from_ref(&action.id), action.kind).await
    }

    /// True while any delete or restore request is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    async fn execute(
        &self,
        operation: Operation,
        ids: &[String],
        kind: EntityKind,
    ) -> Result<DeletionOutcome> {
        let _loading = LoadingGuard::enter(&self.in_flight);

        let actor = self
            .identity
            .current_actor()
            .await?
            .ok_or(AppError::NotAuthenticated)?;

        tracing::info!(
            "{} {} {} as {}",
            operation.as_str(),
            ids.len(),
            kind.label(ids.len()),
            actor.email
        );

        // A single id skips the coordinator
        let result = match ids {
            [id] => {
                let mut result = BulkDeleteResult::default();
                result.record(id, self.gateway.invoke(operation, kind, id, &actor).await);
                result
            }
            _ => self.bulk.run(operation, kind, ids, &actor).await,
        };

        Ok(DeletionOutcome {
            operation,
            kind,
            requested: ids.len(),
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StaticIdentity;
    use crate::database::Actor;
    use crate::services::gateway::testing::ScriptedCaller;
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::sync::Notify;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn signed_in() -> Arc<StaticIdentity> {
        Arc::new(StaticIdentity::signed_in(Actor::new("user-x", "x@example.com")))
    }

    #[tokio::test]
    async fn test_scenario_partial_task_failure() {
        let caller = Arc::new(ScriptedCaller::default().fail_id("t2", "permission denied"));
        let service = DeletionService::new(caller, signed_in());

        let outcome = service
            .soft_delete(&ids(&["t1", "t2", "t3"]), EntityKind::Task)
            .await
            .unwrap();

        assert_eq!(outcome.result.successful, ids(&["t1", "t3"]));
        assert_eq!(outcome.result.failed.len(), 1);
        assert_eq!(outcome.result.failed[0].id, "t2");
        assert_eq!(outcome.result.failed[0].error, "permission denied");
        assert!(!outcome.all_succeeded());
        assert_eq!(outcome.succeeded(), 2);
    }

    #[tokio::test]
    async fn test_boolean_matches_failures() {
        let caller = Arc::new(ScriptedCaller::default());
        let service = DeletionService::new(caller, signed_in());

        let outcome = service
            .soft_delete(&ids(&["a", "b"]), EntityKind::Appointment)
            .await
            .unwrap();

        assert!(outcome.all_succeeded());
        assert!(outcome.result.failed.is_empty());
    }

    #[tokio::test]
    async fn test_unauthenticated_makes_no_calls() {
        let caller = Arc::new(ScriptedCaller::default());
        let service = DeletionService::new(caller.clone(), Arc::new(StaticIdentity::signed_out()));

        let err = service
            .soft_delete(&ids(&["t1"]), EntityKind::Task)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotAuthenticated));
        assert_eq!(err.to_string(), "User not authenticated");
        assert_eq!(caller.call_count(), 0);
        assert!(!service.is_loading());
    }

    #[tokio::test]
    async fn test_single_delete_offers_undo() {
        let caller = Arc::new(ScriptedCaller::default());
        let service = DeletionService::new(caller.clone(), signed_in());

        let outcome = service.soft_delete(&ids(&["d1"]), EntityKind::Document).await.unwrap();
        let undo = outcome.undo_action().unwrap();
        assert_eq!(
            undo,
            UndoAction {
                kind: EntityKind::Document,
                id: "d1".to_string()
            }
        );

        let restored = service.undo(&undo).await.unwrap();
        assert_eq!(restored.operation, Operation::Restore);
        assert!(restored.all_succeeded());
        assert_eq!(caller.recorded()[1].0, "restore_document");
    }

    #[tokio::test]
    async fn test_no_undo_for_bulk_or_failure() {
        let caller = Arc::new(ScriptedCaller::default().fail_id("bad", "nope"));
        let service = DeletionService::new(caller, signed_in());

        let bulk = service.soft_delete(&ids(&["a", "b"]), EntityKind::Task).await.unwrap();
        assert!(bulk.undo_action().is_none());

        let failed = service.soft_delete(&ids(&["bad"]), EntityKind::Task).await.unwrap();
        assert!(failed.undo_action().is_none());
        assert!(!failed.all_succeeded());
    }

    #[tokio::test]
    async fn test_empty_request() {
        let caller = Arc::new(ScriptedCaller::default());
        let service = DeletionService::new(caller.clone(), signed_in());

        let outcome = service.restore(&[], EntityKind::Contact).await.unwrap();

        assert_eq!(outcome.requested, 0);
        assert!(outcome.all_succeeded());
        assert_eq!(caller.call_count(), 0);
    }

    /// Blocks every call until released
    struct GateCaller {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ProcedureCaller for GateCaller {
        async fn call(&self, _procedure: &str, _args: Value) -> Result<Value> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn test_is_loading_while_in_flight() {
        let caller = Arc::new(GateCaller {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let service = DeletionService::new(caller.clone(), signed_in());
        assert!(!service.is_loading());

        let task = {
            let service = service.clone();
            tokio::spawn(async move { service.soft_delete(&ids(&["t1"]), EntityKind::Task).await })
        };

        caller.entered.notified().await;
        assert!(service.is_loading());

        caller.release.notify_one();
        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.all_succeeded());
        assert!(!service.is_loading());
    }
}
