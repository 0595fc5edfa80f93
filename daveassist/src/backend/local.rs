//! Local backend
//!
//! Serves the ten remote procedures and the trash reads from the SQLite
//! repository, so offline mode and tests exercise the same argument keys
//! the hosted procedures expect.

use super::{IdentityProvider, ProcedureCaller, TrashSource};
use crate::database::{Actor, Operation, Repository, TrashedRow};
use crate::error::{AppError, Result};
use crate::registry::EntityKind;
use async_trait::async_trait;
use serde_json::Value;

/// Repository-backed implementation of the backend ports
#[derive(Clone)]
pub struct LocalBackend {
    repo: Repository,
}

impl LocalBackend {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }
}

fn string_arg<'a>(args: &'a Value, key: &str, procedure: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Remote(format!("{}: missing argument {}", procedure, key)))
}

#[async_trait]
impl ProcedureCaller for LocalBackend {
    async fn call(&self, procedure: &str, args: Value) -> Result<Value> {
        let (operation, kind) = Operation::from_procedure(procedure)
            .ok_or_else(|| AppError::Remote(format!("Unknown procedure: {}", procedure)))?;

        let id = string_arg(&args, kind.spec().id_param, procedure)?;
        let actor = Actor::new(
            string_arg(&args, "actor_user_id", procedure)?,
            string_arg(&args, "actor_email", procedure)?,
        );

        match operation {
            Operation::SoftDelete => self.repo.soft_delete(kind, id, &actor).await?,
            Operation::Restore => self.repo.restore(kind, id, &actor).await?,
        }

        Ok(Value::Null)
    }
}

#[async_trait]
impl TrashSource for LocalBackend {
    async fn fetch_trashed(
        &self,
        kind: EntityKind,
        group_id: &str,
        limit: u32,
    ) -> Result<Vec<TrashedRow>> {
        self.repo.list_trashed(kind, group_id, limit).await
    }
}

/// Identity fixed at construction; `None` models a signed-out session
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    actor: Option<Actor>,
}

impl StaticIdentity {
    pub fn signed_in(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    pub fn signed_out() -> Self {
        Self { actor: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_actor(&self) -> Result<Option<Actor>> {
        Ok(self.actor.clone())
    }
}
