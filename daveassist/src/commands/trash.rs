//! Trash view commands
//!
//! Listing, counting and restoring from the "Recently Deleted" view, plus
//! the retention purge the local store runs on behalf of the backend.

use super::notify::{describe_error, describe_outcome, NotificationSink};
use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::registry::EntityKind;
use crate::services::{DeletedItem, TrashListing};
use chrono::Utc;
use std::fmt;
use std::str::FromStr;

/// `<type>:<id>` reference to a trashed row, e.g. `task:7f3c…`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub kind: EntityKind,
    pub id: String,
}

impl FromStr for ItemRef {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = s
            .split_once(':')
            .filter(|(_, id)| !id.trim().is_empty())
            .ok_or_else(|| AppError::Config(format!("Expected <type>:<id>, got '{}'", s)))?;

        Ok(Self {
            kind: kind.parse()?,
            id: id.trim().to_string(),
        })
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Trash of one care group, newest deletion first, display cap applied
pub async fn list_trash(state: &AppState, group_id: &str) -> Result<TrashListing> {
    state.trash_service.listing(group_id).await
}

/// Number of trashed rows in one care group
pub async fn count_trash(state: &AppState, group_id: &str) -> Result<usize> {
    state.trash_service.count_deleted(group_id).await
}

/// Pick the referenced rows out of the current trash
pub fn select_items(trash: &[DeletedItem], refs: &[ItemRef]) -> Result<Vec<DeletedItem>> {
    refs.iter()
        .map(|r| {
            trash
                .iter()
                .find(|item| item.kind == r.kind && item.id == r.id)
                .cloned()
                .ok_or_else(|| AppError::Remote(format!("{} {} is not in the trash", r.kind, r.id)))
        })
        .collect()
}

/// Restore a selection that may span several entity kinds.
///
/// One notification is emitted per kind restored. If a later kind's request
/// is rejected, the kinds already restored are still reported before the
/// error notification.
pub async fn restore_from_trash(
    state: &AppState,
    sink: &dyn NotificationSink,
    group_id: &str,
    refs: &[ItemRef],
) -> Result<bool> {
    let selection = state
        .trash_service
        .list_deleted(group_id)
        .await
        .and_then(|trash| select_items(&trash, refs));

    let items = match selection {
        Ok(items) => items,
        Err(e) => {
            sink.notify(describe_error(&e));
            return Err(e);
        }
    };

    let restored = state.trash_service.restore_selected(&items).await;
    for outcome in &restored.outcomes {
        sink.notify(describe_outcome(outcome));
    }

    match restored.error {
        Some(e) => {
            sink.notify(describe_error(&e));
            Err(e)
        }
        None => Ok(restored.outcomes.iter().all(|o| o.all_succeeded())),
    }
}

/// Hard-delete rows whose retention window has passed (local store only)
pub async fn purge_expired(state: &AppState, retention_days: i64) -> Result<u64> {
    let repo = state
        .local_repo
        .as_ref()
        .ok_or_else(|| AppError::Config("Purge is run by the hosted backend".to_string()))?;

    repo.purge_expired(Utc::now(), retention_days).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_ref() {
        let r: ItemRef = "task:t1".parse().unwrap();
        assert_eq!(r.kind, EntityKind::Task);
        assert_eq!(r.id, "t1");
        assert_eq!(r.to_string(), "task:t1");
    }

    #[test]
    fn test_parse_item_ref_errors() {
        assert!("t1".parse::<ItemRef>().is_err());
        assert!("task:".parse::<ItemRef>().is_err());
        assert!(matches!(
            "note:n1".parse::<ItemRef>(),
            Err(AppError::UnknownEntityKind(_))
        ));
    }
}
