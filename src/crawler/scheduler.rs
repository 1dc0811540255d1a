//! Player selection for the harvest loop
//!
//! This module decides which player to poll next. Rules are tried in order,
//! each as its own pass over the registry:
//! 1. A player that has never been harvested
//! 2. A player not harvested for at least half the crawl window
//! 3. A player whose estimated new matches reach half a match page
//! 4. The player with the highest estimated new matches
//!
//! Rules 1-3 take the first eligible player in registry order. Rule 4 keeps
//! the later player on ties.

use crate::state::Player;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Why a player was chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionReason {
    NeverHarvested,
    Stale { elapsed: Duration },
    LikelyOverflow { estimate: f64 },
    HighestYield { estimate: f64 },
}

impl SelectionReason {
    /// Short name used in log lines
    pub fn rule(&self) -> &'static str {
        match self {
            SelectionReason::NeverHarvested => "never-harvested",
            SelectionReason::Stale { .. } => "stale",
            SelectionReason::LikelyOverflow { .. } => "likely-overflow",
            SelectionReason::HighestYield { .. } => "highest-yield",
        }
    }
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionReason::NeverHarvested => write!(f, "never harvested"),
            SelectionReason::Stale { elapsed } => {
                write!(f, "not harvested for {}s", elapsed.num_seconds())
            }
            SelectionReason::LikelyOverflow { estimate } => {
                write!(f, "estimated {:.1} new matches, more than half a page", estimate)
            }
            SelectionReason::HighestYield { estimate } => {
                write!(f, "highest estimate at {:.1} new matches", estimate)
            }
        }
    }
}

/// A chosen player, by position in the registry order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub reason: SelectionReason,
}

/// Picks the next player to poll
///
/// # Arguments
///
/// * `players` - The registry in its iteration order
/// * `now` - Current wall-clock time
/// * `window` - Crawl window length
/// * `match_page_maximum` - Largest match id page one request returns
///
/// # Returns
///
/// * `Some(Selection)` - The player to poll and why
/// * `None` - The registry is empty
pub fn select_next_player(
    players: &[Player],
    now: DateTime<Utc>,
    window: Duration,
    match_page_maximum: u32,
) -> Option<Selection> {
    if players.is_empty() {
        return None;
    }

    if let Some(index) = players.iter().position(Player::is_never_harvested) {
        return Some(Selection {
            index,
            reason: SelectionReason::NeverHarvested,
        });
    }

    let half_window = window / 2;
    for (index, player) in players.iter().enumerate() {
        if let Some(elapsed) = player.elapsed_since_harvest(now) {
            if elapsed >= half_window {
                return Some(Selection {
                    index,
                    reason: SelectionReason::Stale { elapsed },
                });
            }
        }
    }

    let half_page = f64::from(match_page_maximum) / 2.0;
    let estimates: Vec<f64> = players
        .iter()
        .map(|player| player.estimate_new_match_count(now, window))
        .collect();

    if let Some(index) = estimates.iter().position(|&estimate| estimate >= half_page) {
        return Some(Selection {
            index,
            reason: SelectionReason::LikelyOverflow {
                estimate: estimates[index],
            },
        });
    }

    let mut best = 0;
    for (index, &estimate) in estimates.iter().enumerate() {
        if estimate >= estimates[best] {
            best = index;
        }
    }
    Some(Selection {
        index: best,
        reason: SelectionReason::HighestYield {
            estimate: estimates[best],
        },
    })
}
