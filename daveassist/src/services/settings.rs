//! Settings service
//!
//! Manages backend connection and trash view settings using JSON file
//! storage, with `DAVEASSIST_*` environment variables taking precedence.

use crate::config::{
    ENV_ACCESS_TOKEN, ENV_ANON_KEY, ENV_BACKEND_URL, HTTP_TIMEOUT_SECS, TRASH_DISPLAY_LIMIT,
    TRASH_QUERY_LIMIT_PER_KIND,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Hosted backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Project URL, e.g. `https://abc.supabase.co`
    #[serde(default)]
    pub url: Option<String>,
    /// Public API key sent as the `apikey` header
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Session access token of the signed-in user
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    HTTP_TIMEOUT_SECS
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Trash view limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrashSettings {
    #[serde(default = "default_per_kind_limit")]
    pub per_kind_limit: u32,
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,
}

fn default_per_kind_limit() -> u32 {
    TRASH_QUERY_LIMIT_PER_KIND
}

fn default_display_limit() -> usize {
    TRASH_DISPLAY_LIMIT
}

impl Default for TrashSettings {
    fn default() -> Self {
        Self {
            per_kind_limit: default_per_kind_limit(),
            display_limit: default_display_limit(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub trash: TrashSettings,
}

impl AppSettings {
    /// Overlay values found through `lookup` (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_BACKEND_URL) {
            self.backend.url = Some(url);
        }
        if let Some(key) = non_empty(ENV_ANON_KEY) {
            self.backend.anon_key = Some(key);
        }
        if let Some(token) = non_empty(ENV_ACCESS_TOKEN) {
            self.backend.access_token = Some(token);
        }
    }
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Load settings from disk, falling back to defaults if the file is absent
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found at {:?}, using defaults", self.settings_path);
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Load settings and apply environment overrides
    pub async fn load_with_env(&self) -> Result<AppSettings> {
        let mut settings = self.load().await?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }
}
