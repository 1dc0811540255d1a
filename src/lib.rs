//! Rank-Harvester: an adaptive ranked-ladder crawler
//!
//! This crate discovers ranked-ladder players from a rate-limited ranking API and
//! incrementally harvests their match history, spending the server-declared
//! request budget on the players most likely to have new matches.

pub mod clock;
pub mod config;
pub mod crawler;
pub mod output;
pub mod riot;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Rank-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised by the ranking API client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Invalid rate limit header '{0}'")]
    InvalidRateLimitHeader(String),

    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: Box<ApiError>,
    },
}

impl ApiError {
    /// HTTP status carried by this error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use crawler::Harvester;
pub use riot::{Division, RiotClient, Tier};
pub use state::{MatchLedger, Player, PlayerRegistry};
