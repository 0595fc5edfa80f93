//! Repository layer for database operations
//!
//! Implements the soft-delete and restore procedures for the five entity
//! tables, the scoped trash queries and retention purge. Each procedure
//! runs in one transaction: the row state check, the update of all
//! deletion fields and the audit entry commit together or not at all.

use super::models::*;
use crate::config::TRASH_RETENTION_DAYS;
use crate::error::{AppError, Result};
use crate::registry::EntityKind;
use chrono::{DateTime, Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a live row with a generated id
    pub async fn create_entity(
        &self,
        kind: EntityKind,
        req: CreateEntityRequest,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.create_entity_with_id(kind, &id, req).await?;
        Ok(id)
    }

    /// Create a live row with a caller-chosen id
    pub async fn create_entity_with_id(
        &self,
        kind: EntityKind,
        id: &str,
        req: CreateEntityRequest,
    ) -> Result<()> {
        let spec = kind.spec();
        // One placeholder per title column of this kind
        let placeholders = vec!["?"; spec.title_columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} (id, {}, {}, created_at) VALUES (?, ?, {}, ?)",
            spec.table,
            spec.group_column,
            spec.title_columns.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(id).bind(&req.group_id);
        for column in spec.title_columns {
            query = query.bind(req.column(column));
        }
        query.bind(Utc::now()).execute(&self.pool).await?;

        tracing::debug!("Created {}: {}", kind, id);
        Ok(())
    }

    /// Get the deletion state of a row, trashed or not
    pub async fn get_entity(&self, kind: EntityKind, id: &str) -> Result<EntityRecord> {
        let spec = kind.spec();
        let sql = format!(
            r#"
            SELECT id, {} AS group_id, is_deleted, deleted_at, deleted_by_user_id, deleted_by_email
            FROM {} WHERE id = ?
            "#,
            spec.group_column, spec.table
        );

        sqlx::query_as::<_, EntityRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(kind, id))
    }

    /// Move a live row to the trash
    pub async fn soft_delete(&self, kind: EntityKind, id: &str, actor: &Actor) -> Result<()> {
        self.soft_delete_at(kind, id, actor, Utc::now()).await
    }

    /// Move a live row to the trash with an explicit deletion time
    pub async fn soft_delete_at(
        &self,
        kind: EntityKind,
        id: &str,
        actor: &Actor,
        deleted_at: DateTime<Utc>,
    ) -> Result<()> {
        let table = kind.spec().table;
        let mut tx = self.pool.begin().await?;

        // Only live rows can be trashed; a second delete keeps the first attribution
        match current_state(&mut tx, kind, id).await? {
            None => return Err(not_found(kind, id)),
            Some(true) => {
                return Err(AppError::Remote(format!("{} {} is already deleted", kind, id)))
            }
            Some(false) => {}
        }

        sqlx::query(&format!(
            r#"
            UPDATE {} SET is_deleted = 1, deleted_at = ?, deleted_by_user_id = ?, deleted_by_email = ?
            WHERE id = ? AND is_deleted = 0
            "#,
            table
        ))
        .bind(deleted_at)
        .bind(&actor.user_id)
        .bind(&actor.email)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Audit entry commits with the update
        record_audit(&mut tx, kind, id, Operation::SoftDelete, actor).await?;
        tx.commit().await?;

        tracing::debug!("Soft deleted {}: {}", kind, id);
        Ok(())
    }

    /// Bring a trashed row back
    pub async fn restore(&self, kind: EntityKind, id: &str, actor: &Actor) -> Result<()> {
        let table = kind.spec().table;
        let mut tx = self.pool.begin().await?;

        // Only trashed rows can be restored
        match current_state(&mut tx, kind, id).await? {
            None => return Err(not_found(kind, id)),
            Some(false) => {
                return Err(AppError::Remote(format!(
                    "{} {} is not currently deleted",
                    kind, id
                )))
            }
            Some(true) => {}
        }

        sqlx::query(&format!(
            r#"
            UPDATE {} SET is_deleted = 0, deleted_at = NULL, deleted_by_user_id = NULL, deleted_by_email = NULL
            WHERE id = ? AND is_deleted = 1
            "#,
            table
        ))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Deletion fields are cleared; the audit log keeps who restored it
        record_audit(&mut tx, kind, id, Operation::Restore, actor).await?;
        tx.commit().await?;

        tracing::debug!("Restored {}: {}", kind, id);
        Ok(())
    }

    /// Trashed rows of one kind within a care group, newest deletion first
    pub async fn list_trashed(
        &self,
        kind: EntityKind,
        group_id: &str,
        limit: u32,
    ) -> Result<Vec<TrashedRow>> {
        let spec = kind.spec();
        let sql = format!(
            r#"
            SELECT id, deleted_at, deleted_by_user_id, deleted_by_email, {}
            FROM {}
            WHERE {} = ? AND is_deleted = 1 AND deleted_at IS NOT NULL
            ORDER BY deleted_at DESC
            LIMIT ?
            "#,
            spec.title_columns.join(", "),
            spec.table,
            spec.group_column
        );

        let rows = sqlx::query_as::<_, TrashedRow>(&sql)
            .bind(group_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Audit entries for one row, oldest first
    pub async fn list_audit(&self, entity_id: &str) -> Result<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT * FROM audit_log WHERE entity_id = ? ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Permanently delete rows trashed before `now - retention_days`.
    ///
    /// Returns the number of rows removed across all entity tables.
    /// Windows shorter than `TRASH_RETENTION_DAYS` are rejected.
    pub async fn purge_expired(&self, now: DateTime<Utc>, retention_days: i64) -> Result<u64> {
        if retention_days < TRASH_RETENTION_DAYS {
            return Err(AppError::Config(format!(
                "Retention must be at least {} days, got {}",
                TRASH_RETENTION_DAYS, retention_days
            )));
        }

        // Huge windows fall outside the timestamp range
        let cutoff = Duration::try_days(retention_days)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                AppError::Config(format!("Retention of {} days is out of range", retention_days))
            })?;
        let mut tx = self.pool.begin().await?;
        let mut purged = 0;

        // All tables purge in one transaction
        for kind in EntityKind::ALL {
            let rows = sqlx::query(&format!(
                "DELETE FROM {} WHERE is_deleted = 1 AND deleted_at < ?",
                kind.spec().table
            ))
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if rows > 0 {
                tracing::debug!("Purged {} expired {}", rows, kind.label(2));
            }
            purged += rows;
        }

        tx.commit().await?;

        tracing::info!("Purged {} rows trashed before {}", purged, cutoff);
        Ok(purged)
    }
}

fn not_found(kind: EntityKind, id: &str) -> AppError {
    AppError::Remote(format!("{} {} not found", kind, id))
}

/// `Some(is_deleted)` for an existing row, `None` if absent
async fn current_state(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: &str,
) -> Result<Option<bool>> {
    let state = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT is_deleted FROM {} WHERE id = ?",
        kind.spec().table
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(state)
}

async fn record_audit(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: &str,
    operation: Operation,
    actor: &Actor,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (id, entity_type, entity_id, action, actor_user_id, actor_email, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(kind.as_str())
    .bind(id)
    .bind(operation.as_str())
    .bind(&actor.user_id)
    .bind(&actor.email)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}
