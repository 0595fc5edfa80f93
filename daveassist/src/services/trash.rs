//! Trash view service
//!
//! Lists the trash of one care group by querying each entity table on its
//! own, projecting rows to `DeletedItem`, then merging newest deletion
//! first. The tables share no parent, so there is no single cross-table
//! query.

use super::deletion::{DeletionOutcome, DeletionService};
use crate::backend::TrashSource;
use crate::config::{TRASH_DISPLAY_LIMIT, TRASH_QUERY_LIMIT_PER_KIND, TRASH_RETENTION_DAYS};
use crate::database::TrashedRow;
use crate::error::{AppError, Result};
use crate::registry::EntityKind;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One row in the trash view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub title: String,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by_email: Option<String>,
    pub deleted_by_user_id: Option<String>,
}

impl DeletedItem {
    pub fn from_row(kind: EntityKind, row: TrashedRow) -> Self {
        let title = synthesize_title(kind, &row);
        Self {
            id: row.id,
            kind,
            title,
            deleted_at: row.deleted_at,
            deleted_by_email: row.deleted_by_email,
            deleted_by_user_id: row.deleted_by_user_id,
        }
    }

    /// When the store is expected to purge this row
    pub fn purge_at(&self) -> DateTime<Utc> {
        self.deleted_at + Duration::days(TRASH_RETENTION_DAYS)
    }

    /// Whole days left before purge, never negative
    pub fn days_until_purge(&self, now: DateTime<Utc>) -> i64 {
        (self.purge_at() - now).num_days().max(0)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Display title for a trashed row; the source column differs per kind
pub fn synthesize_title(kind: EntityKind, row: &TrashedRow) -> String {
    match kind {
        EntityKind::Contact => {
            let name = [non_empty(&row.first_name), non_empty(&row.last_name)]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            if name.is_empty() {
                "Unnamed contact".to_string()
            } else {
                name
            }
        }
        EntityKind::Appointment => non_empty(&row.description)
            .unwrap_or("Untitled appointment")
            .to_string(),
        EntityKind::Task => non_empty(&row.title).unwrap_or("Untitled task").to_string(),
        EntityKind::Activity => non_empty(&row.title)
            .unwrap_or("Untitled activity")
            .to_string(),
        EntityKind::Document => non_empty(&row.title)
            .or_else(|| non_empty(&row.file_name))
            .unwrap_or("Untitled document")
            .to_string(),
    }
}

/// Merged trash with the display cap applied
#[derive(Debug, Clone, Serialize)]
pub struct TrashListing {
    pub items: Vec<DeletedItem>,
    /// Rows found before the display cap
    pub total: usize,
    /// True when older rows were cut off
    pub truncated: bool,
}

/// Service for listing and restoring trashed rows
#[derive(Clone)]
pub struct TrashService {
    source: Arc<dyn TrashSource>,
    deletion: DeletionService,
    per_kind_limit: u32,
    display_limit: usize,
}

impl TrashService {
    pub fn new(source: Arc<dyn TrashSource>, deletion: DeletionService) -> Self {
        Self {
            source,
            deletion,
            per_kind_limit: TRASH_QUERY_LIMIT_PER_KIND,
            display_limit: TRASH_DISPLAY_LIMIT,
        }
    }

    pub fn with_limits(mut self, per_kind_limit: u32, display_limit: usize) -> Self {
        self.per_kind_limit = per_kind_limit;
        self.display_limit = display_limit;
        self
    }

    async fn fetch_kind(&self, kind: EntityKind, group_id: &str) -> Result<Vec<DeletedItem>> {
        let rows = self
            .source
            .fetch_trashed(kind, group_id, self.per_kind_limit)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| DeletedItem::from_row(kind, row))
            .collect())
    }

    /// Every trashed row of the group, newest deletion first
    pub async fn list_deleted(&self, group_id: &str) -> Result<Vec<DeletedItem>> {
        let (contacts, appointments, tasks, activities, documents) = tokio::try_join!(
            self.fetch_kind(EntityKind::Contact, group_id),
            self.fetch_kind(EntityKind::Appointment, group_id),
            self.fetch_kind(EntityKind::Task, group_id),
            self.fetch_kind(EntityKind::Activity, group_id),
            self.fetch_kind(EntityKind::Document, group_id),
        )?;

        let mut items: Vec<DeletedItem> = contacts
            .into_iter()
            .chain(appointments)
            .chain(tasks)
            .chain(activities)
            .chain(documents)
            .collect();
        // Newest deletion first across all tables
        items.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));

        tracing::debug!("Trash for group {} holds {} items", group_id, items.len());
        Ok(items)
    }

    /// Trash with the display cap applied
    pub async fn listing(&self, group_id: &str) -> Result<TrashListing> {
        let mut items = self.list_deleted(group_id).await?;
        let total = items.len();
        let truncated = total > self.display_limit;
        items.truncate(self.display_limit);

        Ok(TrashListing {
            items,
            total,
            truncated,
        })
    }

    /// Number of trashed rows visible to the trash view
    pub async fn count_deleted(&self, group_id: &str) -> Result<usize> {
        Ok(self.list_deleted(group_id).await?.len())
    }

    /// Restore a selection that may mix entity kinds.
    ///
    /// Restores are scoped to one kind per call, so the selection is
    /// grouped by kind first; one outcome is returned per kind attempted.
    /// Kinds already committed keep their outcome when a later kind's
    /// request is rejected; the remaining kinds are not attempted.
    pub async fn restore_selected(&self, items: &[DeletedItem]) -> SelectionRestore {
        let mut by_kind: BTreeMap<EntityKind, Vec<String>> = BTreeMap::new();
        for item in items {
            by_kind.entry(item.kind).or_default().push(item.id.clone());
        }

        let mut restored = SelectionRestore::default();
        for (kind, ids) in by_kind {
            match self.deletion.restore(&ids, kind).await {
                Ok(outcome) => restored.outcomes.push(outcome),
                Err(e) => {
                    tracing::warn!("Restore of {} stopped: {}", kind.label(ids.len()), e);
                    restored.error = Some(e);
                    break;
                }
            }
        }

        restored
    }
}

/// Per-kind outcomes of a mixed restore
#[derive(Debug, Default)]
pub struct SelectionRestore {
    pub outcomes: Vec<DeletionOutcome>,
    /// Why the remaining kinds were not attempted
    pub error: Option<AppError>,
}

impl SelectionRestore {
    pub fn all_succeeded(&self) -> bool {
        self.error.is_none() && self.outcomes.iter().all(DeletionOutcome::all_succeeded)
    }
}
