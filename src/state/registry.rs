//! In-memory player registry and match ledger
//!
//! Both are rebuilt from scratch on every process start and bounded by the
//! crawl window: anything last seen before `now - window` is pruned.

use crate::riot::{Division, LeagueEntry, Tier};
use crate::state::player::Player;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

/// Every known player, kept in a deterministic iteration order
///
/// New players are appended in sighting order; [`PlayerRegistry::reorder`]
/// sorts them by rank. That order is the scan order of the selection
/// heuristic and therefore its tie-break.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    index: HashMap<String, usize>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players in iteration order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, puuid: &str) -> Option<&Player> {
        self.index.get(puuid).map(|&i| &self.players[i])
    }

    pub fn get_mut(&mut self, puuid: &str) -> Option<&mut Player> {
        match self.index.get(puuid) {
            Some(&i) => Some(&mut self.players[i]),
            None => None,
        }
    }

    /// Creates or refreshes the player named by a roster entry
    ///
    /// Returns true if the player was new.
    pub fn upsert_from_roster_entry(&mut self, entry: &LeagueEntry, now: DateTime<Utc>) -> bool {
        if let Some(player) = self.get_mut(&entry.puuid) {
            player.update_from_entry(entry, now);
            return false;
        }
        self.index.insert(entry.puuid.clone(), self.players.len());
        self.players.push(Player::from_entry(entry, now));
        true
    }

    /// Stamps a harvest on a player
    ///
    /// Returns false if the player is not tracked.
    pub fn record_harvest(
        &mut self,
        puuid: &str,
        match_ids: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> bool {
        match self.get_mut(puuid) {
            Some(player) => {
                player.record_harvest(match_ids.len(), now);
                true
            }
            None => false,
        }
    }

    /// Removes players whose last roster sighting is older than `window`
    ///
    /// Returns the number of players removed.
    pub fn prune_players(&mut self, window: Duration, now: DateTime<Utc>) -> usize {
        let before = self.players.len();
        self.players
            .retain(|player| now - player.last_roster_time <= window);
        self.rebuild_index();
        before - self.players.len()
    }

    /// Sorts players by tier, then division, following the given orders
    ///
    /// Tiers and divisions earlier in the slices come first. The sort is
    /// stable, so players of equal rank keep their relative order.
    pub fn reorder(&mut self, tier_order: &[Tier], division_order: &[Division]) {
        let tier_pos = |tier: Tier| tier_order.iter().position(|t| *t == tier).unwrap_or(usize::MAX);
        let division_pos = |division: Division| {
            division_order
                .iter()
                .position(|d| *d == division)
                .unwrap_or(usize::MAX)
        };
        self.players
            .sort_by_key(|player| (tier_pos(player.tier), division_pos(player.division)));
        self.rebuild_index();
    }

    /// Sorts players best rank first using the tier and division rank tables
    pub fn reorder_by_rank(&mut self) {
        self.players
            .sort_by_key(|player| (player.tier.rank(), player.division.rank()));
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .players
            .iter()
            .enumerate()
            .map(|(i, player)| (player.puuid.clone(), i))
            .collect();
    }
}

/// Match id -> time the match document was harvested
///
/// Global de-duplication: a match in the ledger is never fetched again, no
/// matter whose match list it shows up in.
#[derive(Debug, Default)]
pub struct MatchLedger {
    harvested_at: HashMap<String, DateTime<Utc>>,
}

impl MatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.harvested_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.harvested_at.is_empty()
    }

    pub fn contains(&self, match_id: &str) -> bool {
        self.harvested_at.contains_key(match_id)
    }

    pub fn harvested_at(&self, match_id: &str) -> Option<DateTime<Utc>> {
        self.harvested_at.get(match_id).copied()
    }

    pub fn insert(&mut self, match_id: impl Into<String>, now: DateTime<Utc>) {
        self.harvested_at.insert(match_id.into(), now);
    }

    /// Ids from `match_ids` that have not been harvested yet
    pub fn new_ids(&self, match_ids: &HashSet<String>) -> HashSet<String> {
        match_ids
            .iter()
            .filter(|id| !self.contains(id))
            .cloned()
            .collect()
    }

    /// Removes entries harvested longer than `window` ago
    ///
    /// Returns the number of entries removed.
    pub fn prune_ledger(&mut self, window: Duration, now: DateTime<Utc>) -> usize {
        let before = self.harvested_at.len();
        self.harvested_at.retain(|_, at| now - *at <= window);
        before - self.harvested_at.len()
    }
}
