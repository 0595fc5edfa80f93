//! Remote delete/restore gateway
//!
//! Invokes one of the ten soft-delete/restore procedures for a single row
//! and normalizes every way the call can fail into a `DeleteResult`.
//! Nothing here returns an error to the caller.

use crate::backend::ProcedureCaller;
use crate::database::{Actor, Operation};
use crate::registry::EntityKind;
use serde::ser::SerializeStruct;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Outcome of one remote soft-delete or restore call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteResult {
    Success,
    Failure { error: String },
}

impl DeleteResult {
    pub fn failure(error: impl Into<String>) -> Self {
        DeleteResult::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeleteResult::Success)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DeleteResult::Success => None,
            DeleteResult::Failure { error } => Some(error),
        }
    }
}

/// Serializes as `{ "success": bool, "error"?: string }`
impl Serialize for DeleteResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            DeleteResult::Success => {
                let mut state = serializer.serialize_struct("DeleteResult", 1)?;
                state.serialize_field("success", &true)?;
                state.end()
            }
            DeleteResult::Failure { error } => {
                let mut state = serializer.serialize_struct("DeleteResult", 2)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
                state.end()
            }
        }
    }
}

/// Arguments for a procedure call; the id key differs per entity kind
pub fn procedure_args(kind: EntityKind, id: &str, actor: &Actor) -> Value {
    let mut args = serde_json::Map::new();
    args.insert(kind.spec().id_param.to_string(), json!(id));
    args.insert("actor_user_id".to_string(), json!(actor.user_id));
    args.insert("actor_email".to_string(), json!(actor.email));
    Value::Object(args)
}

/// Interpret a successful call's payload.
///
/// Some procedures report failure in-band as `{"error": ...}` or
/// `{"success": false, ...}` rather than through the transport.
fn normalize_payload(payload: &Value) -> DeleteResult {
    let Some(object) = payload.as_object() else {
        return DeleteResult::Success;
    };

    let error = match object.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Object(inner)) => Some(
            inner
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(inner.clone()).to_string()),
        ),
        Some(other) => Some(other.to_string()),
    };

    if let Some(error) = error {
        return DeleteResult::failure(error);
    }

    if object.get("success") == Some(&Value::Bool(false)) {
        return DeleteResult::failure("Operation failed");
    }

    DeleteResult::Success
}

/// Typed access to the ten soft-delete/restore procedures
#[derive(Clone)]
pub struct Gateway {
    caller: Arc<dyn ProcedureCaller>,
}

impl Gateway {
    pub fn new(caller: Arc<dyn ProcedureCaller>) -> Self {
        Self { caller }
    }

    /// Move one row to the trash
    pub async fn soft_delete(&self, kind: EntityKind, id: &str, actor: &Actor) -> DeleteResult {
        self.invoke(Operation::SoftDelete, kind, id, actor).await
    }

    /// Bring one row back from the trash
    pub async fn restore(&self, kind: EntityKind, id: &str, actor: &Actor) -> DeleteResult {
        self.invoke(Operation::Restore, kind, id, actor).await
    }

    pub async fn invoke(
        &self,
        operation: Operation,
        kind: EntityKind,
        id: &str,
        actor: &Actor,
    ) -> DeleteResult {
        let procedure = operation.procedure(kind);
        let args = procedure_args(kind, id, actor);

        let result = match self.caller.call(&procedure, args).await {
            Ok(payload) => normalize_payload(&payload),
            Err(e) => DeleteResult::failure(e.to_string()),
        };

        match result.error() {
            None => tracing::debug!("{} {} succeeded", procedure, id),
            Some(error) => tracing::warn!("{} {} failed: {}", procedure, id, error),
        }

        result
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::{AppError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Procedure caller that records calls and replays scripted failures
    #[derive(Default)]
    pub struct ScriptedCaller {
        pub calls: Mutex<Vec<(String, Value)>>,
        errors: HashMap<String, String>,
        payloads: HashMap<String, Value>,
    }

    impl ScriptedCaller {
        /// Fail every call whose id argument equals `id`
        pub fn fail_id(mut self, id: &str, error: &str) -> Self {
            self.errors.insert(id.to_string(), error.to_string());
            self
        }

        /// Answer calls for `id` with `payload` instead of `null`
        pub fn payload_for(mut self, id: &str, payload: Value) -> Self {
            self.payloads.insert(id.to_string(), payload);
            self
        }

        pub fn recorded(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    fn id_of(args: &Value) -> Option<String> {
        let object = args.as_object()?;
        object
            .iter()
            .find(|(key, _)| key.ends_with("_id") && key.as_str() != "actor_user_id")
            .and_then(|(_, value)| value.as_str().map(str::to_string))
    }

    #[async_trait]
    impl ProcedureCaller for ScriptedCaller {
        async fn call(&self, procedure: &str, args: Value) -> Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((procedure.to_string(), args.clone()));

            let id = id_of(&args).unwrap_or_default();
            if let Some(error) = self.errors.get(&id) {
                return Err(AppError::Remote(error.clone()));
            }
            Ok(self.payloads.get(&id).cloned().unwrap_or(Value::Null))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedCaller;
    use super::*;

    fn actor() -> Actor {
        Actor::new("user-1", "carer@example.com")
    }

    #[test]
    fn test_procedure_args_use_kind_specific_key() {
        let args = procedure_args(EntityKind::Task, "t1", &actor());
        assert_eq!(
            args,
            json!({"task_id": "t1", "actor_user_id": "user-1", "actor_email": "carer@example.com"})
        );

        let args = procedure_args(EntityKind::Contact, "c1", &actor());
        assert_eq!(args["contact_id"], "c1");
        assert!(args.get("task_id").is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_calls_named_procedure() {
        let caller = Arc::new(ScriptedCaller::default());
        let gateway = Gateway::new(caller.clone());

        let result = gateway.soft_delete(EntityKind::Document, "d1", &actor()).await;

        assert!(result.is_success());
        let calls = caller.recorded();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "soft_delete_document");
        assert_eq!(calls[0].1["document_id"], "d1");
    }

    #[tokio::test]
    async fn test_restore_calls_named_procedure() {
        let caller = Arc::new(ScriptedCaller::default());
        let gateway = Gateway::new(caller.clone());

        gateway.restore(EntityKind::Appointment, "a1", &actor()).await;

        assert_eq!(caller.recorded()[0].0, "restore_appointment");
    }

    #[tokio::test]
    async fn test_thrown_error_becomes_failure() {
        let caller = Arc::new(ScriptedCaller::default().fail_id("t2", "permission denied"));
        let gateway = Gateway::new(caller);

        let result = gateway.soft_delete(EntityKind::Task, "t2", &actor()).await;

        assert_eq!(result, DeleteResult::failure("permission denied"));
    }

    #[tokio::test]
    async fn test_error_payload_becomes_failure() {
        let caller = Arc::new(
            ScriptedCaller::default()
                .payload_for("t1", json!({"error": "row is locked"}))
                .payload_for("t2", json!({"success": false}))
                .payload_for("t3", json!({"error": {"message": "not allowed", "code": "42501"}}))
                .payload_for("t4", json!({"success": true, "error": null})),
        );
        let gateway = Gateway::new(caller);

        let r1 = gateway.soft_delete(EntityKind::Task, "t1", &actor()).await;
        let r2 = gateway.soft_delete(EntityKind::Task, "t2", &actor()).await;
        let r3 = gateway.soft_delete(EntityKind::Task, "t3", &actor()).await;
        let r4 = gateway.soft_delete(EntityKind::Task, "t4", &actor()).await;

        assert_eq!(r1.error(), Some("row is locked"));
        assert_eq!(r2.error(), Some("Operation failed"));
        assert_eq!(r3.error(), Some("not allowed"));
        assert!(r4.is_success());
    }

    #[test]
    fn test_delete_result_wire_shape() {
        assert_eq!(
            serde_json::to_value(DeleteResult::Success).unwrap(),
            json!({"success": true})
        );
        assert_eq!(
            serde_json::to_value(DeleteResult::failure("nope")).unwrap(),
            json!({"success": false, "error": "nope"})
        );
    }
}
