//! Shared fixtures for the integration tests

use chrono::{DateTime, TimeZone, Utc};
use rank_harvester::config::{ApiConfig, ClientConfig, Config, CrawlConfig, OutputConfig};
use rank_harvester::riot::{Queue, Region, Tier};
use serde_json::{json, Value};

pub const LEAGUE_PREFIX: &str = "/lol/league-exp/v4/entries/RANKED_SOLO_5x5";

/// A configuration pointed at a mock server, with millisecond backoff
pub fn create_test_config(base_url: &str, tiers: Vec<Tier>) -> Config {
    Config {
        api: ApiConfig {
            region: Region::Na1,
            base_url: Some(base_url.to_string()),
        },
        crawl: CrawlConfig {
            tiers,
            queue: Queue::RankedSolo5x5,
            roster_refresh_interval_secs: 86_400,
            crawl_window_secs: 604_800,
            match_page_maximum: 100,
        },
        client: fast_client_config(),
        output: OutputConfig {
            database_path: ":memory:".to_string(),
        },
    }
}

pub fn fast_client_config() -> ClientConfig {
    ClientConfig {
        max_retries: 5,
        retry_base_delay_ms: 1,
        timeout_secs: 5,
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// A roster entry as the league endpoint returns it
pub fn league_entry(puuid: &str, tier: &str, rank: &str) -> Value {
    json!({
        "leagueId": "7f0b8c2e",
        "puuid": puuid,
        "queueType": "RANKED_SOLO_5x5",
        "tier": tier,
        "rank": rank,
        "leaguePoints": 1000,
        "wins": 120,
        "losses": 90,
        "hotStreak": false,
        "veteran": true,
        "freshBlood": false,
        "inactive": false
    })
}

pub fn league_page(prefix: &str, count: usize, tier: &str, rank: &str) -> Value {
    Value::Array(
        (0..count)
            .map(|i| league_entry(&format!("{}-{}", prefix, i), tier, rank))
            .collect(),
    )
}

/// A minimal match document with the fields storage reads
pub fn match_document(match_id: &str, ended: DateTime<Utc>) -> Value {
    json!({
        "metadata": {
            "dataVersion": "2",
            "matchId": match_id,
            "participants": []
        },
        "info": {
            "gameEndTimestamp": ended.timestamp_millis(),
            "gameVersion": "14.5.563.3037",
            "platformId": "NA1",
            "queueId": 420,
            "participants": []
        }
    })
}
