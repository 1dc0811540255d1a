//! Client side of the ranking API
//!
//! This module contains everything that talks to the upstream service:
//! - The API vocabulary (regions, queues, tiers, divisions, roster entries)
//! - The sliding-window rate limiter fed by server-declared rules
//! - The retrying request client that drives both

mod client;
mod rate_limit;
mod types;

pub use client::{
    build_http_client, AttemptOutcome, RetryPolicy, RiotClient, HEADER_API_KEY,
    HEADER_RATE_LIMIT, HEADER_RATE_LIMIT_COUNT, HEADER_RETRY_AFTER,
};
pub use rate_limit::{parse_limit_header, RateLimiter, RateRules};
pub use types::{
    Division, LeagueEntry, MatchIdQuery, MatchType, Queue, QueueId, Region, RegionGroup, Tier,
    MAX_MATCH_PAGE,
};
