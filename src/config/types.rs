use crate::riot::{Queue, Region, RetryPolicy, Tier};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Rank-Harvester
///
/// The API key is deliberately absent: it is a secret and comes from the
/// command line or the environment, never from this file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub client: ClientConfig,
    pub output: OutputConfig,
}

/// Where the ranking API lives
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Platform routing value, e.g. "na1"
    pub region: Region,

    /// Replaces both the platform and the regional host (proxies, tests)
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,
}

impl ApiConfig {
    /// Host serving league endpoints
    pub fn platform_host(&self) -> String {
        match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.riotgames.com", self.region),
        }
    }

    /// Host serving match endpoints
    pub fn regional_host(&self) -> String {
        match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.riotgames.com", self.region.group()),
        }
    }
}

/// What to crawl and how fresh to keep it
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Tiers whose rosters are crawled; visited best first
    pub tiers: Vec<Tier>,

    /// Ranked queue to crawl
    #[serde(default = "default_queue")]
    pub queue: Queue,

    /// Time between roster refreshes (seconds)
    #[serde(rename = "roster-refresh-interval-secs", default = "default_roster_refresh")]
    pub roster_refresh_interval_secs: u64,

    /// Trailing span within which players and matches stay tracked (seconds)
    #[serde(rename = "crawl-window-secs", default = "default_crawl_window")]
    pub crawl_window_secs: u64,

    /// Largest match-id page requested per player
    #[serde(rename = "match-page-maximum", default = "default_match_page_maximum")]
    pub match_page_maximum: u32,
}

impl CrawlConfig {
    pub fn roster_refresh_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.roster_refresh_interval_secs as i64)
    }

    pub fn crawl_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.crawl_window_secs as i64)
    }

    /// Configured tiers, best first and without repeats
    pub fn tiers_best_first(&self) -> Vec<Tier> {
        let mut tiers = self.tiers.clone();
        tiers.sort_by_key(Tier::rank);
        tiers.dedup();
        tiers
    }
}

/// Request client tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Retries after the first attempt before a request is given up
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Unit of the computed backoff delays (milliseconds)
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_queue() -> Queue {
    Queue::RankedSolo5x5
}

fn default_roster_refresh() -> u64 {
    24 * 60 * 60
}

fn default_crawl_window() -> u64 {
    7 * 24 * 60 * 60
}

fn default_match_page_maximum() -> u32 {
    100
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_base_delay() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}
