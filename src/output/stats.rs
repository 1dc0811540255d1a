//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{StorageResult, StorageStats};
use chrono::{DateTime, Utc};

/// Harvest statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestStatistics {
    /// Total number of stored roster rows
    pub roster_rows: u64,

    /// Number of distinct players ever seen on a roster
    pub distinct_players: u64,

    /// Total number of stored matches
    pub matches: u64,

    /// Stored matches per queue, largest first
    pub matches_by_queue: Vec<(String, u64)>,

    /// End time of the newest stored match
    pub latest_match_end: Option<DateTime<Utc>>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn StorageStats) -> StorageResult<HarvestStatistics> {
    Ok(HarvestStatistics {
        roster_rows: storage.count_roster_rows()?,
        distinct_players: storage.count_distinct_players()?,
        matches: storage.count_matches()?,
        matches_by_queue: storage.matches_by_queue()?,
        latest_match_end: storage.latest_match_end()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Roster rows: {}", stats.roster_rows);
    println!("  Distinct players: {}", stats.distinct_players);
    println!("  Matches: {}", stats.matches);
    match stats.latest_match_end {
        Some(ended) => println!("  Latest match ended: {}", ended.to_rfc3339()),
        None => println!("  Latest match ended: -"),
    }
    println!();

    if !stats.matches_by_queue.is_empty() {
        println!("Matches by Queue:");
        for (queue, count) in &stats.matches_by_queue {
            let percentage = if stats.matches > 0 {
                (*count as f64 / stats.matches as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", queue, count, percentage);
        }
        println!();
    }
}
