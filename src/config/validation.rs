use crate::config::types::{ApiConfig, ClientConfig, Config, CrawlConfig, OutputConfig};
use crate::riot::MAX_MATCH_PAGE;
use crate::ConfigError;
use url::Url;

/// Upper bound for every duration setting: one year
const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_crawl_config(&config.crawl)?;
    validate_client_config(&config.client)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the API key supplied outside the config file
pub fn validate_api_key(api_key: &str) -> Result<(), ConfigError> {
    if api_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "API key cannot be empty (pass --api-key or set API_KEY)".to_string(),
        ));
    }
    Ok(())
}

/// Validates API host configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = &config.base_url {
        let url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::InvalidUrl(format!(
                "base-url '{}' must use http or https",
                base_url
            )));
        }
    }
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.tiers.is_empty() {
        return Err(ConfigError::Validation(
            "tiers must name at least one tier".to_string(),
        ));
    }

    if config.roster_refresh_interval_secs < 1
        || config.roster_refresh_interval_secs > MAX_DURATION_SECS
    {
        return Err(ConfigError::Validation(format!(
            "roster-refresh-interval-secs must be between 1 and {}, got {}",
            MAX_DURATION_SECS, config.roster_refresh_interval_secs
        )));
    }

    if config.crawl_window_secs < 1 || config.crawl_window_secs > MAX_DURATION_SECS {
        return Err(ConfigError::Validation(format!(
            "crawl-window-secs must be between 1 and {}, got {}",
            MAX_DURATION_SECS, config.crawl_window_secs
        )));
    }

    if config.match_page_maximum < 1 || config.match_page_maximum > MAX_MATCH_PAGE {
        return Err(ConfigError::Validation(format!(
            "match-page-maximum must be between 1 and {}, got {}",
            MAX_MATCH_PAGE, config.match_page_maximum
        )));
    }

    Ok(())
}

/// Validates request client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
