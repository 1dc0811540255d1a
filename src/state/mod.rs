//! State module for tracking harvest progress
//!
//! This module provides the in-memory state the harvest loop owns.
//!
//! # Components
//!
//! - `Player`: One ladder player with its roster and harvest history
//! - `PlayerRegistry`: Every known player in deterministic rank order
//! - `MatchLedger`: Every harvested match id, for global de-duplication

mod player;
mod registry;

// Re-export main types
pub use player::{Harvest, Player};
pub use registry::{MatchLedger, PlayerRegistry};
