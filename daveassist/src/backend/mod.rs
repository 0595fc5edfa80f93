//! Backend ports
//!
//! The services only see the hosted backend through these traits:
//! - `ProcedureCaller`: invoke a named remote procedure with JSON arguments
//! - `TrashSource`: scoped read of trashed rows for one entity table
//! - `IdentityProvider`: resolve the signed-in user
//!
//! `rest` talks to the hosted PostgREST/auth endpoints, `local` adapts the
//! SQLite repository to the same contracts.

pub mod local;
pub mod rest;

pub use local::{LocalBackend, StaticIdentity};
pub use rest::RestBackend;

use crate::database::{Actor, TrashedRow};
use crate::error::Result;
use crate::registry::EntityKind;
use async_trait::async_trait;

/// Invokes named remote procedures.
///
/// Implementations may signal failure either by returning `Err` or by
/// returning a payload such as `{"error": "..."}`; the gateway normalizes
/// both.
#[async_trait]
pub trait ProcedureCaller: Send + Sync {
    async fn call(&self, procedure: &str, args: serde_json::Value) -> Result<serde_json::Value>;
}

/// Reads soft-deleted rows of one entity table
#[async_trait]
pub trait TrashSource: Send + Sync {
    /// Rows with `is_deleted = true AND deleted_at IS NOT NULL` in the
    /// group, ordered by `deleted_at` descending, at most `limit` rows.
    async fn fetch_trashed(
        &self,
        kind: EntityKind,
        group_id: &str,
        limit: u32,
    ) -> Result<Vec<TrashedRow>>;
}

/// Resolves the acting user
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when there is no signed-in session
    async fn current_actor(&self) -> Result<Option<Actor>>;
}
