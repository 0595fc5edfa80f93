//! Bulk operation coordinator
//!
//! Applies the gateway to a list of ids one at a time, in input order,
//! and partitions the outcomes. A failure never stops the remaining ids.
//! Ids are not deduplicated: a repeated id is sent again and gets its own
//! outcome.

use super::gateway::{DeleteResult, Gateway};
use crate::database::{Actor, Operation};
use crate::registry::EntityKind;
use serde::Serialize;

/// One id that could not be deleted or restored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub id: String,
    pub error: String,
}

/// Partitioned outcome of a bulk call.
///
/// Every requested id lands in exactly one of the two lists, once per
/// occurrence in the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteResult {
    pub successful: Vec<String>,
    pub failed: Vec<FailedItem>,
}

impl BulkDeleteResult {
    /// Route one id's outcome to the matching bucket
    pub fn record(&mut self, id: &str, result: DeleteResult) {
        match result {
            DeleteResult::Success => self.successful.push(id.to_string()),
            DeleteResult::Failure { error } => self.failed.push(FailedItem {
                id: id.to_string(),
                error,
            }),
        }
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.id.as_str()).collect()
    }

    pub fn first_failure(&self) -> Option<&FailedItem> {
        self.failed.first()
    }

    /// Total number of recorded outcomes
    pub fn len(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sequential fan-out over the gateway
#[derive(Clone)]
pub struct BulkCoordinator {
    gateway: Gateway,
}

impl BulkCoordinator {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn bulk_soft_delete(
        &self,
        kind: EntityKind,
        ids: &[String],
        actor: &Actor,
    ) -> BulkDeleteResult {
        self.run(Operation::SoftDelete, kind, ids, actor).await
    }

    pub async fn bulk_restore(
        &self,
        kind: EntityKind,
        ids: &[String],
        actor: &Actor,
    ) -> BulkDeleteResult {
        self.run(Operation::Restore, kind, ids, actor).await
    }

    pub async fn run(
        &self,
        operation: Operation,
        kind: EntityKind,
        ids: &[String],
        actor: &Actor,
    ) -> BulkDeleteResult {
        tracing::info!(
            "Bulk {} of {} {}",
            operation.as_str(),
            ids.len(),
            kind.label(ids.len())
        );

        let mut result = BulkDeleteResult::default();
        for id in ids {
            let outcome = self.gateway.invoke(operation, kind, id, actor).await;
            result.record(id, outcome);
        }

        if !result.failed.is_empty() {
            tracing::warn!(
                "Bulk {}: {} succeeded, {} failed",
                operation.as_str(),
                result.successful.len(),
                result.failed.len()
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gateway::testing::ScriptedCaller;
    use std::sync::Arc;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn actor() -> Actor {
        Actor::new("user-1", "carer@example.com")
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let caller = Arc::new(ScriptedCaller::default().fail_id("t2", "permission denied"));
        let bulk = BulkCoordinator::new(Gateway::new(caller.clone()));

        let result = bulk
            .bulk_soft_delete(EntityKind::Task, &ids(&["t1", "t2", "t3"]), &actor())
            .await;

        assert_eq!(result.successful, ids(&["t1", "t3"]));
        assert_eq!(
            result.failed,
            vec![FailedItem {
                id: "t2".to_string(),
                error: "permission denied".to_string()
            }]
        );
        assert_eq!(caller.call_count(), 3);
    }

    #[tokio::test]
    async fn test_calls_made_in_input_order() {
        let caller = Arc::new(ScriptedCaller::default());
        let bulk = BulkCoordinator::new(Gateway::new(caller.clone()));

        bulk.bulk_restore(EntityKind::Contact, &ids(&["c3", "c1", "c2"]), &actor())
            .await;

        let order: Vec<String> = caller
            .recorded()
            .into_iter()
            .map(|(procedure, args)| {
                assert_eq!(procedure, "restore_contact");
                args["contact_id"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(order, ids(&["c3", "c1", "c2"]));
    }

    #[tokio::test]
    async fn test_partition_covers_every_id() {
        let caller = Arc::new(
            ScriptedCaller::default()
                .fail_id("b", "locked")
                .fail_id("d", "not found"),
        );
        let bulk = BulkCoordinator::new(Gateway::new(caller));
        let input = ids(&["a", "b", "c", "d", "e"]);

        let result = bulk.bulk_soft_delete(EntityKind::Activity, &input, &actor()).await;

        let mut seen: Vec<String> = result.successful.clone();
        seen.extend(result.failed_ids().into_iter().map(str::to_string));
        seen.sort();
        let mut expected = input.clone();
        expected.sort();
        assert_eq!(seen, expected);
        assert_eq!(result.len(), input.len());
        assert!(result
            .successful
            .iter()
            .all(|id| !result.failed_ids().contains(&id.as_str())));
    }

    #[tokio::test]
    async fn test_duplicate_ids_processed_twice() {
        let caller = Arc::new(ScriptedCaller::default());
        let bulk = BulkCoordinator::new(Gateway::new(caller.clone()));

        let result = bulk
            .bulk_soft_delete(EntityKind::Task, &ids(&["t1", "t1"]), &actor())
            .await;

        assert_eq!(caller.call_count(), 2);
        assert_eq!(result.successful, ids(&["t1", "t1"]));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let caller = Arc::new(ScriptedCaller::default());
        let bulk = BulkCoordinator::new(Gateway::new(caller.clone()));

        let result = bulk.bulk_soft_delete(EntityKind::Task, &[], &actor()).await;

        assert!(result.is_empty());
        assert_eq!(caller.call_count(), 0);
    }
}
