//! Commands exposed at the UI boundary
//!
//! This module organizes commands into logical submodules:
//! - `deletion`: Delete, restore and undo for one entity kind
//! - `trash`: Trash listing, mixed-kind restore and retention purge
//! - `notify`: Notifications built from outcomes, and their sinks

pub mod deletion;
pub mod notify;
pub mod trash;

pub use deletion::*;
pub use notify::{
    describe_error, describe_outcome, ConsoleSink, MemorySink, Notification, NotificationLevel,
    NotificationSink, TracingSink,
};
pub use trash::*;

use serde::Serialize;

/// Application information structure
#[derive(Debug, Serialize)]
pub struct AppInfo {
    pub version: String,
    pub backend: String,
}

/// Get application information
pub fn get_app_info(state: &crate::app::AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend_name.to_string(),
    }
}
