//! Storage module for persisting harvested documents
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Best-effort persistence of roster pages and match documents
//! - Read-side queries for run statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult, StorageStats};
