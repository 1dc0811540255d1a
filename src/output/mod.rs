//! Output module for reporting on harvested data
//!
//! This module handles:
//! - Summarizing what the database holds
//! - Printing the roster crawl plan for a dry run

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};

use crate::config::Config;
use crate::riot::{Division, Tier};

/// The (tier, division) pairs a roster refresh visits, in order
///
/// Tiers go best first; apex tiers only contribute division I.
pub fn roster_plan(config: &Config) -> Vec<(Tier, Division)> {
    config
        .crawl
        .tiers_best_first()
        .into_iter()
        .flat_map(|tier| tier.divisions().iter().map(move |&division| (tier, division)))
        .collect()
}
