//! Application configuration constants
//!
//! Central location for retention rules, query limits and environment
//! variable names used throughout the application.

// ===== Trash Retention =====

/// Days a soft-deleted row stays recoverable before the store purges it
pub const TRASH_RETENTION_DAYS: i64 = 30;

// ===== Trash View Limits =====

/// Maximum trashed rows fetched per entity table.
/// With five tables the merged list holds at most 250 rows before capping.
pub const TRASH_QUERY_LIMIT_PER_KIND: u32 = 50;

/// Maximum merged rows shown at once; older rows are reported as truncated
pub const TRASH_DISPLAY_LIMIT: usize = 100;

// ===== Backend Connection =====

/// Timeout for a single request to the hosted backend
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Path prefix for PostgREST table and RPC endpoints
pub const REST_PATH: &str = "/rest/v1";

/// Path of the auth endpoint returning the current session's user
pub const AUTH_USER_PATH: &str = "/auth/v1/user";

// ===== Environment Variables =====

pub const ENV_BACKEND_URL: &str = "DAVEASSIST_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "DAVEASSIST_ANON_KEY";
pub const ENV_ACCESS_TOKEN: &str = "DAVEASSIST_ACCESS_TOKEN";
pub const ENV_SETTINGS_PATH: &str = "DAVEASSIST_SETTINGS";
pub const ENV_USER_ID: &str = "DAVEASSIST_USER_ID";
pub const ENV_USER_EMAIL: &str = "DAVEASSIST_USER_EMAIL";

/// Settings file used when none is given
pub const DEFAULT_SETTINGS_FILE: &str = "daveassist.json";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "daveassist=info,warn";
