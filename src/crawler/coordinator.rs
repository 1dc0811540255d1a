//! Harvest coordinator - main loop orchestration logic
//!
//! This module contains the loop that alternates between two states:
//! - Roster refresh: page through every configured tier and division,
//!   then prune and reorder the registry
//! - Player poll: pick one player, fetch their match ids and every match
//!   document not seen before
//!
//! The loop owns the registry, the ledger, and the client (and with it the
//! rate limiter). There is no concurrent access to any of them.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::crawler::scheduler::{select_next_player, Selection};
use crate::riot::{Division, MatchIdQuery, RiotClient, Tier};
use crate::state::{MatchLedger, PlayerRegistry};
use crate::storage::{SqliteStorage, Storage};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// What one iteration of the loop did
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Every roster page was fetched and the registry rebuilt
    RosterRefreshed {
        pages: usize,
        entries: usize,
        players: usize,
    },

    /// One player's matches were harvested
    PlayerPolled {
        puuid: String,
        match_ids: usize,
        new_matches: usize,
    },

    /// Nobody to poll; nothing to do until the next roster refresh
    Idle { until_refresh: std::time::Duration },
}

/// Main harvest loop state
pub struct Harvester<S: Storage> {
    config: Config,
    client: RiotClient,
    registry: PlayerRegistry,
    ledger: MatchLedger,
    storage: S,
    clock: Arc<dyn Clock>,
    last_roster_refresh: Option<DateTime<Utc>>,
}

impl<S: Storage> Harvester<S> {
    /// Creates a new harvester with empty state
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `api_key` - Secret sent with every request
    /// * `storage` - Where roster pages and match documents are written
    /// * `clock` - Wall-clock source for registry and ledger timestamps
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run; the first step is a roster refresh
    /// * `Err(HarvestError)` - The key is empty or the HTTP client failed to build
    pub fn new(
        config: Config,
        api_key: &str,
        storage: S,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, HarvestError> {
        crate::config::validate_api_key(api_key)?;
        let client = RiotClient::new(api_key, &config.api, &config.client)?;

        Ok(Self {
            config,
            client,
            registry: PlayerRegistry::new(),
            ledger: MatchLedger::new(),
            storage,
            clock,
            last_roster_refresh: None,
        })
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &MatchLedger {
        &self.ledger
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn client(&self) -> &RiotClient {
        &self.client
    }

    pub fn last_roster_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_roster_refresh
    }

    /// Whether the roster refresh interval has passed
    pub fn is_roster_refresh_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_roster_refresh {
            Some(last) => now - last >= self.config.crawl.roster_refresh_interval(),
            None => true,
        }
    }

    /// Time left until the next roster refresh is due
    pub fn time_until_refresh(&self, now: DateTime<Utc>) -> std::time::Duration {
        let Some(last) = self.last_roster_refresh else {
            return std::time::Duration::ZERO;
        };
        (last + self.config.crawl.roster_refresh_interval() - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }

    /// Runs the harvest loop until a request fails for good
    ///
    /// There is no other way out: the loop is meant to run until the process
    /// is stopped. State is not persisted, so a restart begins with a fresh
    /// roster refresh.
    pub async fn run(&mut self) -> Result<(), HarvestError> {
        tracing::info!(
            region = %self.config.api.region,
            queue = %self.config.crawl.queue,
            tiers = ?self.config.crawl.tiers_best_first(),
            "Starting harvest"
        );

        loop {
            if let Step::Idle { until_refresh } = self.step().await? {
                tracing::warn!(
                    wait_secs = until_refresh.as_secs(),
                    "No players to poll, waiting for next roster refresh"
                );
                tokio::time::sleep(until_refresh).await;
            }
        }
    }

    /// Runs one iteration of the loop
    ///
    /// A due roster refresh always goes first; otherwise exactly one player
    /// is polled.
    pub async fn step(&mut self) -> Result<Step, HarvestError> {
        let now = self.clock.now();
        if self.is_roster_refresh_due(now) {
            return self.refresh_rosters().await;
        }

        let selection = select_next_player(
            self.registry.players(),
            now,
            self.config.crawl.crawl_window(),
            self.config.crawl.match_page_maximum,
        );
        match selection {
            Some(selection) => self.poll_player(selection).await,
            None => Ok(Step::Idle {
                until_refresh: self.time_until_refresh(now),
            }),
        }
    }

    /// Pages through every configured tier and division, best first
    ///
    /// Apex tiers are only queried at division I.
    async fn refresh_rosters(&mut self) -> Result<Step, HarvestError> {
        tracing::info!(players = self.registry.len(), "Refreshing rosters");
        let mut pages = 0;
        let mut entries_seen = 0;

        for tier in self.config.crawl.tiers_best_first() {
            for &division in tier.divisions() {
                let (tier_pages, tier_entries) = self.refresh_division(tier, division).await?;
                pages += tier_pages;
                entries_seen += tier_entries;
            }
        }

        let now = self.clock.now();
        let window = self.config.crawl.crawl_window();
        let pruned_players = self.registry.prune_players(window, now);
        let pruned_matches = self.ledger.prune_ledger(window, now);
        self.registry.reorder_by_rank();
        self.last_roster_refresh = Some(now);

        tracing::info!(
            pages,
            entries = entries_seen,
            pruned_players,
            pruned_matches,
            players = self.registry.len(),
            matches = self.ledger.len(),
            "Roster refresh complete"
        );

        Ok(Step::RosterRefreshed {
            pages,
            entries: entries_seen,
            players: self.registry.len(),
        })
    }

    /// Fetches pages 1, 2, ... until an empty one comes back
    async fn refresh_division(
        &mut self,
        tier: Tier,
        division: Division,
    ) -> Result<(usize, usize), HarvestError> {
        let queue = self.config.crawl.queue;
        let mut page = 1;
        let mut entries_seen = 0;

        loop {
            let entries = self
                .client
                .get_league(queue, tier, division, page)
                .await?;
            if entries.is_empty() {
                tracing::debug!(%tier, %division, page, "Empty roster page, division done");
                return Ok(((page - 1) as usize, entries_seen));
            }

            let now = self.clock.now();
            let mut new_players = 0;
            for entry in &entries {
                if self.registry.upsert_from_roster_entry(entry, now) {
                    new_players += 1;
                }
            }
            self.storage.write_rosters(&entries, now);

            tracing::info!(
                %tier,
                %division,
                page,
                entries = entries.len(),
                new_players,
                "Roster page ingested"
            );
            entries_seen += entries.len();
            page += 1;
        }
    }

    /// Harvests the selected player's matches
    async fn poll_player(&mut self, selection: Selection) -> Result<Step, HarvestError> {
        let player = &self.registry.players()[selection.index];
        let puuid = player.puuid.clone();
        let now = self.clock.now();
        let window = self.config.crawl.crawl_window();

        tracing::info!(
            puuid = %puuid,
            tier = %player.tier,
            division = %player.division,
            rule = selection.reason.rule(),
            elapsed_secs = player.elapsed_since_harvest(now).map(|e| e.num_seconds()),
            estimate = player.estimate_new_match_count(now, window),
            "Selected player: {}",
            selection.reason
        );

        let query = MatchIdQuery {
            start_time: Some((now - window).timestamp()),
            queue: Some(self.config.crawl.queue.id()),
            count: self.config.crawl.match_page_maximum,
            ..MatchIdQuery::default()
        };
        let match_ids: HashSet<String> = self
            .client
            .get_match_ids(&puuid, &query)
            .await?
            .into_iter()
            .collect();

        self.registry
            .record_harvest(&puuid, &match_ids, self.clock.now());

        let mut new_ids: Vec<String> = self.ledger.new_ids(&match_ids).into_iter().collect();
        new_ids.sort();
        tracing::info!(
            puuid = %puuid,
            match_ids = match_ids.len(),
            new_ids = new_ids.len(),
            "Fetched match ids"
        );

        let total = new_ids.len();
        for (index, match_id) in new_ids.into_iter().enumerate() {
            let document = self.client.get_match(&match_id).await?;
            let harvested_at = self.clock.now();
            self.storage.write_match(&document, harvested_at);
            tracing::debug!(match_id = %match_id, index = index + 1, total, "Harvested match");
            self.ledger.insert(match_id, harvested_at);
        }

        Ok(Step::PlayerPolled {
            puuid,
            match_ids: match_ids.len(),
            new_matches: total,
        })
    }
}

impl Harvester<SqliteStorage> {
    /// Creates a harvester writing to the configured database on the
    /// system clock
    pub fn from_config(config: Config, api_key: &str) -> Result<Self, HarvestError> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        Self::new(config, api_key, storage, Arc::new(SystemClock))
    }
}

/// Runs the harvest loop with production storage and clock
///
/// # Example
///
/// ```no_run
/// use rank_harvester::config::load_config;
/// use rank_harvester::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// run_harvest(config, "RGAPI-example").await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config, api_key: &str) -> Result<(), HarvestError> {
    let mut harvester = Harvester::from_config(config, api_key)?;
    harvester.run().await
}
