//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::riot::{LeagueEntry, Queue};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult, StorageStats};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

/// The columns of a `matches` row pulled out of a match document
#[derive(Debug, PartialEq)]
struct MatchRow<'a> {
    match_id: &'a str,
    ended_at: DateTime<Utc>,
    region: &'a str,
    version: &'a str,
    queue: String,
}

impl<'a> MatchRow<'a> {
    fn from_document(document: &'a Value) -> StorageResult<Self> {
        let match_id = document
            .pointer("/metadata/matchId")
            .and_then(Value::as_str)
            .ok_or(StorageError::MissingField("metadata.matchId"))?;
        let info = document
            .get("info")
            .ok_or(StorageError::MissingField("info"))?;
        let ended_ms = info
            .get("gameEndTimestamp")
            .and_then(Value::as_i64)
            .ok_or(StorageError::MissingField("info.gameEndTimestamp"))?;
        let ended_at = Utc
            .timestamp_millis_opt(ended_ms)
            .single()
            .ok_or(StorageError::InvalidTimestamp(ended_ms))?;
        let region = info
            .get("platformId")
            .and_then(Value::as_str)
            .ok_or(StorageError::MissingField("info.platformId"))?;
        let version = info
            .get("gameVersion")
            .and_then(Value::as_str)
            .ok_or(StorageError::MissingField("info.gameVersion"))?;
        let queue_id = info
            .get("queueId")
            .and_then(Value::as_u64)
            .ok_or(StorageError::MissingField("info.queueId"))?;
        let queue = u32::try_from(queue_id)
            .ok()
            .and_then(Queue::from_id)
            .map(|q| q.as_str().to_string())
            .unwrap_or_else(|| queue_id.to_string());

        Ok(Self {
            match_id,
            ended_at,
            region,
            version,
            queue,
        })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file; missing parent
    ///   directories are created
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn insert_rosters(
        &mut self,
        entries: &[LeagueEntry],
        crawled_at: DateTime<Utc>,
    ) -> StorageResult<usize> {
        let crawled_at = timestamp(crawled_at);
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO leagues (crawled_at, puuid, queue, tier, rank, dump)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for entry in entries {
                let queue = entry
                    .queue_type
                    .as_deref()
                    .ok_or(StorageError::MissingField("queueType"))?;
                let dump = serde_json::to_string(entry)?;
                stmt.execute(params![
                    crawled_at,
                    entry.puuid,
                    queue,
                    entry.tier.as_str(),
                    entry.division.as_str(),
                    dump,
                ])?;
            }
        }
        tx.commit()?;
        Ok(entries.len())
    }

    fn insert_match(&mut self, document: &Value, crawled_at: DateTime<Utc>) -> StorageResult<()> {
        let row = MatchRow::from_document(document)?;
        let dump = serde_json::to_string(document)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO matches (crawled_at, ended_at, match_id, region, version, queue, dump)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                timestamp(crawled_at),
                timestamp(row.ended_at),
                row.match_id,
                row.region,
                row.version,
                row.queue,
                dump,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

impl Storage for SqliteStorage {
    fn write_rosters(&mut self, entries: &[LeagueEntry], crawled_at: DateTime<Utc>) {
        if entries.is_empty() {
            return;
        }
        match self.insert_rosters(entries, crawled_at) {
            Ok(rows) => tracing::debug!(rows, "Inserted entries into 'leagues' table"),
            Err(e) => tracing::error!(
                error = %e,
                entries = entries.len(),
                "Failed to insert entries into 'leagues' table"
            ),
        }
    }

    fn write_match(&mut self, document: &Value, crawled_at: DateTime<Utc>) {
        let match_id = document
            .pointer("/metadata/matchId")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>");
        match self.insert_match(document, crawled_at) {
            Ok(()) => tracing::debug!(match_id, "Inserted entry into 'matches' table"),
            Err(e) => tracing::error!(
                match_id,
                error = %e,
                "Failed to insert entry into 'matches' table"
            ),
        }
    }
}

impl StorageStats for SqliteStorage {
    fn count_roster_rows(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM leagues")
    }

    fn count_distinct_players(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(DISTINCT puuid) FROM leagues")
    }

    fn count_matches(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM matches")
    }

    fn matches_by_queue(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT queue, COUNT(*) FROM matches GROUP BY queue ORDER BY COUNT(*) DESC, queue",
        )?;
        let rows = stmt.query_map([], |row| {
            let count: i64 = row.get(1)?;
            Ok((row.get::<_, String>(0)?, count.max(0) as u64))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn latest_match_end(&self) -> StorageResult<Option<DateTime<Utc>>> {
        let latest: Option<String> =
            self.conn
                .query_row("SELECT MAX(ended_at) FROM matches", [], |row| row.get(0))?;
        Ok(latest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }
}
