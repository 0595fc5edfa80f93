//! Error types for DaveAssist
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized for the UI boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Unknown entity type: {0}")]
    UnknownEntityKind(String),

    /// A remote procedure or backend query reported a failure.
    #[error("{0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
