//! DaveAssist library
//!
//! Soft delete, restore and the trash view for care-group entities. The
//! library is used by the `daveassist` binary and by the integration tests.

pub mod app;
pub mod backend;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod registry;
pub mod services;
