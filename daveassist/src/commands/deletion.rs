//! Delete, restore and undo commands
//!
//! Each command runs one request through the deletion service and emits
//! exactly one notification, including when the request is rejected for
//! lack of a session.

use super::notify::{describe_error, describe_outcome, NotificationSink};
use crate::app::AppState;
use crate::error::Result;
use crate::registry::EntityKind;
use crate::services::{DeletionOutcome, UndoAction};

fn report(sink: &dyn NotificationSink, result: Result<DeletionOutcome>) -> Result<bool> {
    match result {
        Ok(outcome) => {
            sink.notify(describe_outcome(&outcome));
            Ok(outcome.all_succeeded())
        }
        Err(e) => {
            sink.notify(describe_error(&e));
            Err(e)
        }
    }
}

/// Move rows to the trash; `Ok(true)` only if every id succeeded
pub async fn delete_entities(
    state: &AppState,
    sink: &dyn NotificationSink,
    kind: EntityKind,
    ids: &[String],
) -> Result<bool> {
    report(sink, state.deletion_service.soft_delete(ids, kind).await)
}

/// Restore rows from the trash; `Ok(true)` only if every id succeeded
pub async fn restore_entities(
    state: &AppState,
    sink: &dyn NotificationSink,
    kind: EntityKind,
    ids: &[String],
) -> Result<bool> {
    report(sink, state.deletion_service.restore(ids, kind).await)
}

/// Run the undo action offered after a single delete
pub async fn undo_delete(
    state: &AppState,
    sink: &dyn NotificationSink,
    action: &UndoAction,
) -> Result<bool> {
    report(sink, state.deletion_service.undo(action).await)
}
