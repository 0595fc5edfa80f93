//! Database models
//!
//! Rust structs representing deletable rows, trash projections and audit
//! entries. All models use serde so they cross the UI boundary unchanged.

use crate::registry::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The signed-in user performing a delete or restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub email: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}

/// The two state transitions a deletable row supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SoftDelete,
    Restore,
}

impl Operation {
    /// Name used in audit entries and log lines
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::SoftDelete => "soft_delete",
            Operation::Restore => "restore",
        }
    }

    /// Remote procedure implementing this transition for `kind`
    pub fn procedure(self, kind: EntityKind) -> String {
        match self {
            Operation::SoftDelete => kind.soft_delete_procedure(),
            Operation::Restore => kind.restore_procedure(),
        }
    }

    /// Resolve a procedure name such as `restore_task` back to its parts
    pub fn from_procedure(name: &str) -> Option<(Operation, EntityKind)> {
        EntityKind::ALL.into_iter().find_map(|kind| {
            if name == kind.soft_delete_procedure() {
                Some((Operation::SoftDelete, kind))
            } else if name == kind.restore_procedure() {
                Some((Operation::Restore, kind))
            } else {
                None
            }
        })
    }
}

/// Deletion state of a single row in one of the entity tables
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntityRecord {
    pub id: String,
    pub group_id: String,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_user_id: Option<String>,
    pub deleted_by_email: Option<String>,
}

impl EntityRecord {
    /// True when the deletion fields agree with each other
    pub fn attribution_consistent(&self) -> bool {
        self.is_deleted == self.deleted_at.is_some()
            && self.is_deleted == self.deleted_by_user_id.is_some()
    }
}

/// A soft-deleted row as returned by a trash query.
///
/// Only the title columns of the row's own kind are selected, so the other
/// title fields stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrashedRow {
    pub id: String,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by_user_id: Option<String>,
    pub deleted_by_email: Option<String>,
    #[sqlx(default)]
    pub title: Option<String>,
    #[sqlx(default)]
    pub description: Option<String>,
    #[sqlx(default)]
    pub first_name: Option<String>,
    #[sqlx(default)]
    pub last_name: Option<String>,
    #[sqlx(default)]
    pub file_name: Option<String>,
}

/// Create entity request for the local store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEntityRequest {
    pub group_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub file_name: Option<String>,
}

impl CreateEntityRequest {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            ..Self::default()
        }
    }

    /// Value for one of the registry's title columns
    pub fn column(&self, name: &str) -> Option<&str> {
        match name {
            "title" => self.title.as_deref(),
            "description" => self.description.as_deref(),
            "first_name" => self.first_name.as_deref(),
            "last_name" => self.last_name.as_deref(),
            "file_name" => self.file_name.as_deref(),
            _ => None,
        }
    }
}

/// Audit log entry written by every successful soft delete or restore
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub actor_user_id: String,
    pub actor_email: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn kind(&self) -> Option<EntityKind> {
        self.entity_type.parse().ok()
    }
}
