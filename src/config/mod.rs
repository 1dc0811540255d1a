//! Configuration module for Rank-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All settings are static for the life of the process.
//!
//! # Example
//!
//! ```no_run
//! use rank_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting {} from {:?}", config.api.region, config.crawl.tiers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, ClientConfig, Config, CrawlConfig, OutputConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, hash_config, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate_api_key;
