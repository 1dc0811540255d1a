//! HTTP client for the ranking API
//!
//! This module handles every request the harvester makes, including:
//! - Building the reqwest client and attaching the API key
//! - Gating each attempt through the sliding-window [`RateLimiter`]
//! - Learning the rate-limit rules the server declares in its headers
//! - Retrying failed attempts with bounded, computed backoff
//!
//! All endpoints are read-only GETs, so every attempt is safe to repeat.

use crate::config::{ApiConfig, ClientConfig};
use crate::riot::rate_limit::{parse_limit_header, RateLimiter};
use crate::riot::types::{Division, LeagueEntry, MatchIdQuery, Queue, Tier, MAX_MATCH_PAGE};
use crate::{ApiError, ApiResult};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

pub const HEADER_API_KEY: &str = "X-Riot-Token";
pub const HEADER_RATE_LIMIT: &str = "X-App-Rate-Limit";
pub const HEADER_RATE_LIMIT_COUNT: &str = "X-App-Rate-Limit-Count";
pub const HEADER_RETRY_AFTER: &str = "Retry-After";

/// Bounded retry schedule
///
/// | Failure | Delay before next attempt |
/// |---------|---------------------------|
/// | HTTP error with `Retry-After` | the header's seconds |
/// | HTTP error without it | `2 × attempt × base_delay` |
/// | Network or decode error | `2^attempt × base_delay` |
///
/// `attempt` counts from zero, so the first HTTP-error retry is immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Unit of both computed backoff formulas
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay after an HTTP error response on the given attempt
    pub fn http_error_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or(self.base_delay * 2 * attempt)
    }

    /// Delay after a network or decode failure on the given attempt
    pub fn transient_error_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Result of a single request attempt
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    /// The server answered with a decodable success body
    Success(T),

    /// The attempt failed in a way another attempt may fix
    Retryable {
        /// What went wrong
        error: ApiError,
        /// How long to wait before trying again
        delay: Duration,
    },

    /// The request can never succeed as built
    Fatal(ApiError),
}

/// Builds the underlying HTTP client
///
/// # Arguments
///
/// * `config` - Client tuning (timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!("rank-harvester/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-aware, retrying client for the ranking API
///
/// Owns the limiter and its rule table; nothing else touches them, so one
/// request is in flight at a time and no locking is needed.
pub struct RiotClient {
    http: Client,
    api_key: String,
    api: ApiConfig,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl RiotClient {
    /// Creates a new client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Secret sent with every request
    /// * `api` - Region and optional host override
    /// * `client` - Retry and timeout settings
    pub fn new(
        api_key: impl Into<String>,
        api: &ApiConfig,
        client: &ClientConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: build_http_client(client)?,
            api_key: api_key.into(),
            api: api.clone(),
            limiter: RateLimiter::new(),
            retry: client.retry_policy(),
        })
    }

    /// The limiter gating this client's requests
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Host serving league endpoints
    pub fn platform_host(&self) -> String {
        self.api.platform_host()
    }

    /// Host serving match endpoints
    pub fn regional_host(&self) -> String {
        self.api.regional_host()
    }

    /// Fetches one page of a queue's roster for a tier and division
    ///
    /// Pages count from 1; an empty page means there are no more.
    pub async fn get_league(
        &mut self,
        queue: Queue,
        tier: Tier,
        division: Division,
        page: u32,
    ) -> ApiResult<Vec<LeagueEntry>> {
        if page < 1 {
            return Err(ApiError::InvalidInput(format!(
                "roster page must be >= 1, got {}",
                page
            )));
        }
        let mut url = endpoint(
            &self.platform_host(),
            &[
                "lol",
                "league-exp",
                "v4",
                "entries",
                queue.as_str(),
                tier.as_str(),
                division.as_str(),
            ],
        )?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        self.get(url).await
    }

    /// Fetches the ids of a player's matches
    pub async fn get_match_ids(
        &mut self,
        puuid: &str,
        query: &MatchIdQuery,
    ) -> ApiResult<Vec<String>> {
        if query.count > MAX_MATCH_PAGE {
            return Err(ApiError::InvalidInput(format!(
                "count must be between 0 and {}, got {}",
                MAX_MATCH_PAGE, query.count
            )));
        }
        let mut url = endpoint(
            &self.regional_host(),
            &["lol", "match", "v5", "matches", "by-puuid", puuid, "ids"],
        )?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_params() {
                pairs.append_pair(key, &value);
            }
        }
        self.get(url).await
    }

    /// Fetches a full match document
    pub async fn get_match(&mut self, match_id: &str) -> ApiResult<Value> {
        let url = endpoint(
            &self.regional_host(),
            &["lol", "match", "v5", "matches", match_id],
        )?;
        self.get(url).await
    }

    /// Sends a GET through the limiter, retrying until it succeeds or the
    /// attempt ceiling is reached
    pub async fn get<T: DeserializeOwned>(&mut self, url: Url) -> ApiResult<T> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            let sent_at = self.limiter.admit().await;

            let (error, delay) = match self.attempt(&url, attempt, sent_at).await {
                AttemptOutcome::Success(body) => return Ok(body),
                AttemptOutcome::Fatal(error) => {
                    tracing::error!(url = %url, error = %error, "Request cannot succeed, not retrying");
                    return Err(error);
                }
                AttemptOutcome::Retryable { error, delay } => (error, delay),
            };

            tracing::warn!(
                attempt = attempt + 1,
                max_attempts,
                url = %url,
                status = ?error.status(),
                error = %error,
                "Request failed"
            );

            if attempt + 1 >= max_attempts {
                tracing::error!(url = %url, attempts = max_attempts, "Max retries exceeded");
                return Err(ApiError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: max_attempts,
                    last: Box::new(error),
                });
            }

            tracing::warn!(delay_secs = delay.as_secs_f64(), "Retrying after delay");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Makes a single attempt and classifies the result
    async fn attempt<T: DeserializeOwned>(
        &mut self,
        url: &Url,
        attempt: u32,
        sent_at: Instant,
    ) -> AttemptOutcome<T> {
        let sent = self
            .http
            .get(url.clone())
            .header(HEADER_API_KEY, &self.api_key)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return AttemptOutcome::Fatal(ApiError::Transport {
                    url: url.to_string(),
                    source: e,
                })
            }
            Err(e) => {
                return AttemptOutcome::Retryable {
                    error: ApiError::Transport {
                        url: url.to_string(),
                        source: e,
                    },
                    delay: self.retry.transient_error_delay(attempt),
                }
            }
        };

        self.observe_rate_headers(response.headers(), sent_at);

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            return AttemptOutcome::Retryable {
                error: ApiError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                },
                delay: self.retry.http_error_delay(attempt, retry_after),
            };
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                return AttemptOutcome::Retryable {
                    error: ApiError::Transport {
                        url: url.to_string(),
                        source: e,
                    },
                    delay: self.retry.transient_error_delay(attempt),
                }
            }
        };

        match serde_json::from_slice(&body) {
            Ok(decoded) => AttemptOutcome::Success(decoded),
            Err(e) => AttemptOutcome::Retryable {
                error: ApiError::Decode {
                    url: url.to_string(),
                    source: e,
                },
                delay: self.retry.transient_error_delay(attempt),
            },
        }
    }

    /// Replaces the limiter's rules when the server declares different ones
    ///
    /// `sent_at` is when the request that got this response was admitted.
    fn observe_rate_headers(&mut self, headers: &HeaderMap, sent_at: Instant) {
        if let Some(count) = header_str(headers, HEADER_RATE_LIMIT_COUNT) {
            tracing::debug!(count, "Rate limit usage");
        }

        let Some(declared) = header_str(headers, HEADER_RATE_LIMIT) else {
            return;
        };
        match parse_limit_header(declared) {
            Ok(rules) => {
                self.limiter.update_rules(rules, sent_at);
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring malformed rate limit header"),
        }
    }
}

/// Joins path segments onto a host, escaping each segment
fn endpoint(host: &str, segments: &[&str]) -> ApiResult<Url> {
    let mut url = Url::parse(host)
        .map_err(|e| ApiError::InvalidInput(format!("invalid API host '{}': {}", host, e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidInput(format!("API host '{}' cannot carry a path", host)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parses an integer-seconds `Retry-After` header
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = header_str(headers, HEADER_RETRY_AFTER)?;
    match value.trim().parse::<u64>() {
        Ok(seconds) => Some(Duration::from_secs(seconds)),
        Err(_) => {
            tracing::warn!(value, "Could not parse Retry-After header, using computed backoff");
            None
        }
    }
}
