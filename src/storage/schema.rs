//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per roster sighting
CREATE TABLE IF NOT EXISTS leagues (
    crawled_at TEXT NOT NULL,
    puuid TEXT NOT NULL,
    queue TEXT NOT NULL,
    tier TEXT NOT NULL,
    rank TEXT NOT NULL,
    dump TEXT NOT NULL,
    PRIMARY KEY (puuid, crawled_at)
);

CREATE INDEX IF NOT EXISTS idx_leagues_tier ON leagues(tier, rank);

-- One row per harvested match
CREATE TABLE IF NOT EXISTS matches (
    crawled_at TEXT NOT NULL,
    ended_at TEXT NOT NULL,
    match_id TEXT NOT NULL,
    region TEXT NOT NULL,
    version TEXT NOT NULL,
    queue TEXT NOT NULL,
    dump TEXT NOT NULL,
    PRIMARY KEY (match_id)
);

CREATE INDEX IF NOT EXISTS idx_matches_queue ON matches(queue);
CREATE INDEX IF NOT EXISTS idx_matches_ended_at ON matches(ended_at);
"#;

/// Initializes the database schema
///
/// Creates all tables and indexes if they don't already exist.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
