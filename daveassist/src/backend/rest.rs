//! Hosted backend client
//!
//! Calls PostgREST RPC endpoints for the ten procedures, reads trashed rows
//! through the table endpoints and resolves the session user through the
//! auth endpoint.

use super::{IdentityProvider, ProcedureCaller, TrashSource};
use crate::config::{AUTH_USER_PATH, ENV_ANON_KEY, ENV_BACKEND_URL, REST_PATH};
use crate::database::{Actor, TrashedRow};
use crate::error::{AppError, Result};
use crate::registry::EntityKind;
use crate::services::settings::BackendSettings;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// HTTP client for the hosted backend
#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

/// Subset of the auth user object this crate needs
#[derive(Debug, Deserialize)]
struct SessionUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl RestBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        let base_url = settings
            .url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::Config(format!("Backend URL not set ({})", ENV_BACKEND_URL)))?;

        let anon_key = settings
            .anon_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Config(format!("API key not set ({})", ENV_ANON_KEY)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            anon_key,
            access_token: settings.access_token.clone(),
        })
    }

    fn rpc_url(&self, procedure: &str) -> String {
        format!("{}{}/rpc/{}", self.base_url, REST_PATH, procedure)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}{}/{}", self.base_url, REST_PATH, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request.header("apikey", &self.anon_key).bearer_auth(bearer)
    }
}

/// PostgREST query parameters for one kind's trash read
pub fn trash_query(kind: EntityKind, group_id: &str, limit: u32) -> Vec<(String, String)> {
    let spec = kind.spec();
    let mut select = vec!["id", "deleted_at", "deleted_by_user_id", "deleted_by_email"];
    select.extend_from_slice(spec.title_columns);

    vec![
        ("select".to_string(), select.join(",")),
        (spec.group_column.to_string(), format!("eq.{}", group_id)),
        ("is_deleted".to_string(), "eq.true".to_string()),
        ("deleted_at".to_string(), "not.is.null".to_string()),
        ("order".to_string(), "deleted_at.desc".to_string()),
        ("limit".to_string(), limit.to_string()),
    ]
}

/// Best human-readable message from an error response body
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error_description", "msg", "error"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl ProcedureCaller for RestBackend {
    async fn call(&self, procedure: &str, args: Value) -> Result<Value> {
        tracing::debug!("POST rpc/{}", procedure);

        let response = self
            .authorize(self.client.post(self.rpc_url(procedure)))
            .json(&args)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AppError::Remote(error_message(status, &body)));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TrashSource for RestBackend {
    async fn fetch_trashed(
        &self,
        kind: EntityKind,
        group_id: &str,
        limit: u32,
    ) -> Result<Vec<TrashedRow>> {
        let table = kind.spec().table;
        tracing::debug!("GET {} trash for group {}", table, group_id);

        let response = self
            .authorize(self.client.get(self.table_url(table)))
            .query(&trash_query(kind, group_id, limit))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(error_message(status, &body)));
        }

        Ok(response.json::<Vec<TrashedRow>>().await?)
    }
}

#[async_trait]
impl IdentityProvider for RestBackend {
    async fn current_actor(&self) -> Result<Option<Actor>> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}{}", self.base_url, AUTH_USER_PATH))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!("Session token rejected by auth endpoint");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(error_message(status, &body)));
        }

        let user: SessionUser = response.json().await?;
        Ok(Some(Actor::new(user.id, user.email.unwrap_or_default())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> BackendSettings {
        BackendSettings {
            url: Some(url.to_string()),
            anon_key: Some("anon".to_string()),
            ..BackendSettings::default()
        }
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let backend = RestBackend::new(&settings("https://abc.supabase.co/")).unwrap();
        assert_eq!(
            backend.rpc_url("soft_delete_task"),
            "https://abc.supabase.co/rest/v1/rpc/soft_delete_task"
        );
        assert_eq!(
            backend.table_url("activity_log"),
            "https://abc.supabase.co/rest/v1/activity_log"
        );
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let err = RestBackend::new(&BackendSettings::default()).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let mut s = settings("https://abc.supabase.co");
        s.anon_key = None;
        let err = RestBackend::new(&s).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_contact_trash_query_uses_care_group_column() {
        let query = trash_query(EntityKind::Contact, "g1", 50);

        assert!(query.contains(&("care_group_id".to_string(), "eq.g1".to_string())));
        assert!(!query.iter().any(|(k, _)| k == "group_id"));
        assert!(query.contains(&(
            "select".to_string(),
            "id,deleted_at,deleted_by_user_id,deleted_by_email,first_name,last_name".to_string()
        )));
    }

    #[test]
    fn test_task_trash_query() {
        let query = trash_query(EntityKind::Task, "g1", 50);

        assert!(query.contains(&("group_id".to_string(), "eq.g1".to_string())));
        assert!(query.contains(&("is_deleted".to_string(), "eq.true".to_string())));
        assert!(query.contains(&("deleted_at".to_string(), "not.is.null".to_string())));
        assert!(query.contains(&("order".to_string(), "deleted_at.desc".to_string())));
        assert!(query.contains(&("limit".to_string(), "50".to_string())));
    }

    #[test]
    fn test_error_message_prefers_postgrest_message() {
        let body = r#"{"code":"42501","message":"permission denied for table tasks","details":null,"hint":null}"#;
        assert_eq!(
            error_message(StatusCode::FORBIDDEN, body),
            "permission denied for table tasks"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_body_and_status() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }

    #[tokio::test]
    async fn test_no_token_means_no_session() {
        let backend = RestBackend::new(&settings("https://abc.supabase.co")).unwrap();
        assert!(backend.current_actor().await.unwrap().is_none());
    }
}
