//! Crawler module for the harvest loop
//!
//! This module contains the core harvesting logic, including:
//! - Choosing which player to poll next
//! - Refreshing rosters and pruning stale state
//! - Overall loop coordination

mod coordinator;
mod scheduler;

pub use coordinator::{run_harvest, Harvester, Step};
pub use scheduler::{select_next_player, Selection, SelectionReason};

use crate::config::Config;
use crate::HarvestError;

/// Runs the harvest loop forever
///
/// This is the main entry point for a harvest. It will:
/// 1. Open the storage database
/// 2. Build the rate-aware HTTP client
/// 3. Refresh rosters whenever the refresh interval has passed
/// 4. Otherwise poll one player at a time
///
/// It only returns when a request fails past its last retry.
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `api_key` - Secret sent with every request
pub async fn harvest(config: Config, api_key: &str) -> Result<(), HarvestError> {
    run_harvest(config, api_key).await
}
