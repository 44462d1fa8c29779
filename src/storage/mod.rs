//! Durable Client Storage
//!
//! SQLite-backed snapshot store for projects and publish history.

pub mod database;
pub mod project_store;

pub use database::{Database, PoolConfig, SharedDatabase};
pub use project_store::ProjectStore;

use std::path::PathBuf;

/// Default database location under the user data directory.
pub fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("ai", "junyeong", "novelpilot")
        .map(|dirs| dirs.data_dir().join("novelpilot.db"))
        .unwrap_or_else(|| PathBuf::from("novelpilot.db"))
}
