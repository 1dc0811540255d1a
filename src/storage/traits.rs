//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::riot::LeagueEntry;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document is missing field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writes are best-effort. An implementation catches its own failures, rolls
/// back, and logs them; nothing it does may interrupt the harvest loop.
pub trait Storage {
    /// Stores one page of roster entries, all stamped with `crawled_at`
    fn write_rosters(&mut self, entries: &[LeagueEntry], crawled_at: DateTime<Utc>);

    /// Stores one full match document
    fn write_match(&mut self, document: &Value, crawled_at: DateTime<Utc>);
}

/// Read side used for `--stats`
pub trait StorageStats {
    /// Number of stored roster rows
    fn count_roster_rows(&self) -> StorageResult<u64>;

    /// Number of distinct players across all roster rows
    fn count_distinct_players(&self) -> StorageResult<u64>;

    /// Number of stored matches
    fn count_matches(&self) -> StorageResult<u64>;

    /// Stored matches grouped by queue, largest group first
    fn matches_by_queue(&self) -> StorageResult<Vec<(String, u64)>>;

    /// End time of the most recently finished stored match
    fn latest_match_end(&self) -> StorageResult<Option<DateTime<Utc>>>;
}
