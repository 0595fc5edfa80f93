//! Entity registry
//!
//! The closed set of entity kinds that support soft delete, and the
//! per-kind facts every other layer needs: remote procedure names, the id
//! argument key each procedure expects, table and group-scope columns, and
//! display labels.
//!
//! Lookups go through an exhaustive `match`, so a new kind cannot be added
//! without giving it a registry entry.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of rows that can be moved to the trash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Contact,
    Appointment,
    Task,
    Activity,
    Document,
}

/// Static facts about one entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySpec {
    /// Suffix of `soft_delete_<suffix>` / `restore_<suffix>`
    pub procedure_suffix: &'static str,
    /// Argument key the remote procedures expect the row id under
    pub id_param: &'static str,
    pub table: &'static str,
    /// Column holding the care-group scope
    pub group_column: &'static str,
    /// Columns the trash view reads to synthesize a title
    pub title_columns: &'static [&'static str],
    pub singular: &'static str,
    pub plural: &'static str,
}

const CONTACT: EntitySpec = EntitySpec {
    procedure_suffix: "contact",
    id_param: "contact_id",
    table: "contacts",
    group_column: "care_group_id",
    title_columns: &["first_name", "last_name"],
    singular: "Contact",
    plural: "contacts",
};

const APPOINTMENT: EntitySpec = EntitySpec {
    procedure_suffix: "appointment",
    id_param: "appointment_id",
    table: "appointments",
    group_column: "group_id",
    title_columns: &["description"],
    singular: "Appointment",
    plural: "appointments",
};

const TASK: EntitySpec = EntitySpec {
    procedure_suffix: "task",
    id_param: "task_id",
    table: "tasks",
    group_column: "group_id",
    title_columns: &["title"],
    singular: "Task",
    plural: "tasks",
};

const ACTIVITY: EntitySpec = EntitySpec {
    procedure_suffix: "activity",
    id_param: "activity_id",
    table: "activity_log",
    group_column: "group_id",
    title_columns: &["title"],
    singular: "Activity",
    plural: "activities",
};

const DOCUMENT: EntitySpec = EntitySpec {
    procedure_suffix: "document",
    id_param: "document_id",
    table: "documents",
    group_column: "group_id",
    title_columns: &["title", "file_name"],
    singular: "Document",
    plural: "documents",
};

impl EntityKind {
    /// Every kind, in registry order
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Contact,
        EntityKind::Appointment,
        EntityKind::Task,
        EntityKind::Activity,
        EntityKind::Document,
    ];

    pub fn spec(self) -> &'static EntitySpec {
        match self {
            EntityKind::Contact => &CONTACT,
            EntityKind::Appointment => &APPOINTMENT,
            EntityKind::Task => &TASK,
            EntityKind::Activity => &ACTIVITY,
            EntityKind::Document => &DOCUMENT,
        }
    }

    /// Wire name, as used in the `type` field of trash items
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Contact => "contact",
            EntityKind::Appointment => "appointment",
            EntityKind::Task => "task",
            EntityKind::Activity => "activity",
            EntityKind::Document => "document",
        }
    }

    pub fn soft_delete_procedure(self) -> String {
        format!("soft_delete_{}", self.spec().procedure_suffix)
    }

    pub fn restore_procedure(self) -> String {
        format!("restore_{}", self.spec().procedure_suffix)
    }

    /// Display label for `count` items: "Task" for one, "tasks" otherwise
    pub fn label(self, count: usize) -> &'static str {
        let spec = self.spec();
        if count == 1 {
            spec.singular
        } else {
            spec.plural
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| AppError::UnknownEntityKind(s.to_string()))
    }
}
