//! A tracked ladder player and its crawl history

use crate::riot::{Division, LeagueEntry, Tier};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Result of the most recent match harvest for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Harvest {
    /// When the match ids were fetched
    pub at: DateTime<Utc>,
    /// How many match ids the fetch returned
    pub match_count: usize,
}

/// A player seen on a roster
///
/// Created on the first roster sighting, refreshed by every later sighting and
/// by every match harvest.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub puuid: String,
    pub tier: Tier,
    pub division: Division,

    /// Last time a roster page listed this player
    pub last_roster_time: DateTime<Utc>,

    /// Last match harvest, if the player has ever been harvested
    pub last_harvest: Option<Harvest>,
}

impl Player {
    /// Creates a never-harvested player from a roster entry
    pub fn from_entry(entry: &LeagueEntry, now: DateTime<Utc>) -> Self {
        Self {
            puuid: entry.puuid.clone(),
            tier: entry.tier,
            division: entry.division,
            last_roster_time: now,
            last_harvest: None,
        }
    }

    /// Refreshes rank and roster time; harvest history is untouched
    pub fn update_from_entry(&mut self, entry: &LeagueEntry, now: DateTime<Utc>) {
        self.tier = entry.tier;
        self.division = entry.division;
        self.last_roster_time = now;
    }

    pub fn record_harvest(&mut self, match_count: usize, now: DateTime<Utc>) {
        self.last_harvest = Some(Harvest {
            at: now,
            match_count,
        });
    }

    pub fn is_never_harvested(&self) -> bool {
        self.last_harvest.is_none()
    }

    /// Time since the last harvest, or None if there never was one
    ///
    /// Clamped at zero so a clock that steps backwards cannot produce a
    /// negative estimate.
    pub fn elapsed_since_harvest(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_harvest
            .map(|harvest| std::cmp::max(now - harvest.at, Duration::zero()))
    }

    /// Expected number of matches played since the last harvest
    ///
    /// Assumes the player keeps the pace of the last harvest, which saw
    /// `match_count` matches over one full `window`. Infinite when the player
    /// was never harvested.
    pub fn estimate_new_match_count(&self, now: DateTime<Utc>, window: Duration) -> f64 {
        let Some(harvest) = self.last_harvest else {
            return f64::INFINITY;
        };
        let elapsed = std::cmp::max(now - harvest.at, Duration::zero());
        harvest.match_count as f64 * seconds(elapsed) / seconds(window)
    }
}

fn seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {}, roster {}",
            self.puuid,
            self.tier,
            self.division,
            self.last_roster_time.to_rfc3339()
        )?;
        match self.last_harvest {
            Some(harvest) => write!(
                f,
                ", harvested {} with {} matches)",
                harvest.at.to_rfc3339(),
                harvest.match_count
            ),
            None => write!(f, ", never harvested)"),
        }
    }
}
