//! Application state and initialization
//!
//! This module wires a backend (hosted or local) into the services.
//! All services are created here and made available through AppState.

use crate::backend::{
    IdentityProvider, LocalBackend, ProcedureCaller, RestBackend, StaticIdentity, TrashSource,
};
use crate::database::{create_pool, Actor, Repository};
use crate::error::Result;
use crate::services::settings::{AppSettings, TrashSettings};
use crate::services::{DeletionService, TrashService};
use std::path::Path;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub deletion_service: DeletionService,
    pub trash_service: TrashService,
    /// Present when running against the local store
    pub local_repo: Option<Repository>,
    pub backend_name: &'static str,
}

impl AppState {
    /// Build services over arbitrary backend ports
    pub fn with_backend(
        caller: Arc<dyn ProcedureCaller>,
        source: Arc<dyn TrashSource>,
        identity: Arc<dyn IdentityProvider>,
        trash: &TrashSettings,
    ) -> Self {
        let deletion_service = DeletionService::new(caller, identity);
        let trash_service = TrashService::new(source, deletion_service.clone())
            .with_limits(trash.per_kind_limit, trash.display_limit);

        Self {
            deletion_service,
            trash_service,
            local_repo: None,
            backend_name: "custom",
        }
    }

    /// Services over the hosted backend
    pub fn remote(settings: &AppSettings) -> Result<Self> {
        let backend = Arc::new(RestBackend::new(&settings.backend)?);
        tracing::info!("Using hosted backend");

        let mut state = Self::with_backend(
            backend.clone(),
            backend.clone(),
            backend,
            &settings.trash,
        );
        state.backend_name = "hosted";
        Ok(state)
    }

    /// Services over a repository, acting as `actor` (or signed out)
    pub fn from_repository(repo: Repository, actor: Option<Actor>, trash: &TrashSettings) -> Self {
        let backend = Arc::new(LocalBackend::new(repo.clone()));
        let identity = Arc::new(match actor {
            Some(actor) => StaticIdentity::signed_in(actor),
            None => StaticIdentity::signed_out(),
        });

        let mut state = Self::with_backend(backend.clone(), backend, identity, trash);
        state.local_repo = Some(repo);
        state.backend_name = "local";
        state
    }

    /// Services over a SQLite file
    pub async fn local(
        db_path: &Path,
        actor: Option<Actor>,
        settings: &AppSettings,
    ) -> Result<Self> {
        tracing::info!("Using local store at {:?}", db_path);
        let pool = create_pool(db_path).await?;
        Ok(Self::from_repository(Repository::new(pool), actor, &settings.trash))
    }
}
