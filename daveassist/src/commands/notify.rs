//! Outcome notifications
//!
//! Builds the one user-facing message each delete or restore request
//! produces, and delivers it to a sink. Partial failures are summarized by
//! the first failure only.

use crate::config::TRASH_RETENTION_DAYS;
use crate::database::Operation;
use crate::error::AppError;
use crate::services::{DeletionOutcome, UndoAction};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    /// Inline "Undo" offered after a single delete
    pub undo: Option<UndoAction>,
}

impl Notification {
    fn new(level: NotificationLevel, title: String, message: String) -> Self {
        Self {
            level,
            title,
            message,
            undo: None,
        }
    }
}

/// Describe a finished request
pub fn describe_outcome(outcome: &DeletionOutcome) -> Notification {
    let kind = outcome.kind;
    let requested = outcome.requested;

    if requested == 0 {
        return Notification::new(
            NotificationLevel::Info,
            "Nothing selected".to_string(),
            format!("No {} were selected.", kind.label(0)),
        );
    }

    if let Some(failure) = outcome.first_failure() {
        let verb = match outcome.operation {
            Operation::SoftDelete => "delete",
            Operation::Restore => "restore",
        };
        let title = format!("Could not {} {}", verb, kind.label(requested).to_lowercase());
        let detail = format!("{}: {}", failure.id, failure.error);
        let message = if outcome.succeeded() > 0 {
            format!(
                "{} of {} {} {}d. {}",
                outcome.succeeded(),
                requested,
                kind.label(requested).to_lowercase(),
                verb,
                detail
            )
        } else {
            detail
        };
        return Notification::new(NotificationLevel::Error, title, message);
    }

    match (outcome.operation, requested) {
        (Operation::SoftDelete, 1) => Notification {
            undo: outcome.undo_action(),
            ..Notification::new(
                NotificationLevel::Success,
                format!("{} moved to trash", kind.label(1)),
                format!("It can be recovered for {} days.", TRASH_RETENTION_DAYS),
            )
        },
        (Operation::SoftDelete, n) => Notification::new(
            NotificationLevel::Success,
            format!("{} {} moved to trash", n, kind.label(n)),
            format!("They can be recovered for {} days.", TRASH_RETENTION_DAYS),
        ),
        (Operation::Restore, 1) => Notification::new(
            NotificationLevel::Success,
            format!("{} restored", kind.label(1)),
            format!("The {} is back where it was.", kind.label(1).to_lowercase()),
        ),
        (Operation::Restore, n) => Notification::new(
            NotificationLevel::Success,
            format!("{} {} restored", n, kind.label(n)),
            format!("The {} are back where they were.", kind.label(n)),
        ),
    }
}

/// Describe a request rejected before any remote call
pub fn describe_error(err: &AppError) -> Notification {
    let title = match err {
        AppError::NotAuthenticated => "Sign in required",
        _ => "Something went wrong",
    };
    Notification::new(NotificationLevel::Error, title.to_string(), err.to_string())
}

/// Receives notifications at the UI boundary
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => {
                tracing::error!("{}: {}", notification.title, notification.message)
            }
            _ => tracing::info!("{}: {}", notification.title, notification.message),
        }
    }
}

/// Prints notifications for the command line
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => {
                eprintln!("✗ {}: {}", notification.title, notification.message)
            }
            _ => println!("✓ {}: {}", notification.title, notification.message),
        }
        if let Some(undo) = &notification.undo {
            println!("  undo: daveassist restore {} {}", undo.kind, undo.id);
        }
    }
}

/// Keeps notifications in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    notifications: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn take(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|mut n| std::mem::take(&mut *n))
            .unwrap_or_default()
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notification: Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }
}
