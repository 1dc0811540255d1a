//! Sliding-window rate limiting driven by server-declared rules
//!
//! The ranking API tells us its budget in a header such as `20:1,100:120`
//! (20 requests per second and 100 per two minutes). The limiter tracks one
//! timestamp queue per declared period and holds a request back until every
//! rule has room for it.

use crate::ApiError;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// Declared rules: period in seconds -> requests allowed within that period
pub type RateRules = BTreeMap<u64, u32>;

/// Parses a rate-limit declaration of the form `count:period[,count:period...]`
///
/// # Example
///
/// ```
/// use rank_harvester::riot::parse_limit_header;
///
/// let rules = parse_limit_header("20:1,100:120").unwrap();
/// assert_eq!(rules.get(&1), Some(&20));
/// assert_eq!(rules.get(&120), Some(&100));
/// ```
pub fn parse_limit_header(value: &str) -> Result<RateRules, ApiError> {
    let invalid = || ApiError::InvalidRateLimitHeader(value.to_string());

    let mut rules = RateRules::new();
    for pair in value.split(',') {
        let (count, period) = pair.trim().split_once(':').ok_or_else(invalid)?;
        let count: u32 = count.trim().parse().map_err(|_| invalid())?;
        let period: u64 = period.trim().parse().map_err(|_| invalid())?;
        if count == 0 || period == 0 {
            return Err(invalid());
        }
        rules.insert(period, count);
    }
    Ok(rules)
}

/// Sliding-window limiter over a replaceable rule set
///
/// Rules start out empty, so the first request is never delayed; the
/// declaration on its response is what arms the limiter.
///
/// A history is kept for every period ever declared, enforced or not, so a
/// period that drops out of the rules and comes back still remembers the
/// requests inside its window.
#[derive(Debug, Default)]
pub struct RateLimiter {
    rules: RateRules,
    history: BTreeMap<u64, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently enforced rules
    pub fn rules(&self) -> &RateRules {
        &self.rules
    }

    /// Requests recorded within the given period
    pub fn recorded(&self, period: u64) -> usize {
        self.history.get(&period).map_or(0, VecDeque::len)
    }

    /// Replaces the rule set wholesale if it differs from the current one
    ///
    /// `sent_at` is the admission time of the request whose response carried
    /// the declaration. A period seen for the first time starts its history
    /// with that request. Returns whether anything changed.
    pub fn update_rules(&mut self, rules: RateRules, sent_at: Instant) -> bool {
        if rules == self.rules {
            return false;
        }
        for period in rules.keys() {
            self.history
                .entry(*period)
                .or_insert_with(|| VecDeque::from([sent_at]));
        }
        tracing::info!(old = ?self.rules, new = ?rules, "Rate limit rules changed");
        self.rules = rules;
        true
    }

    /// Drops timestamps that have aged out of their period
    fn evict_expired(&mut self, now: Instant) {
        for (period, timestamps) in self.history.iter_mut() {
            let window = Duration::from_secs(*period);
            while let Some(&oldest) = timestamps.front() {
                if now.duration_since(oldest) >= window {
                    timestamps.pop_front();
                } else {
                    break;
                }
            }
        }
    }

    /// Calculates how long a new request must wait before every rule has room
    ///
    /// Returns None if a request can be made now. When several rules are full,
    /// the longest of their waits is returned.
    pub fn time_until_admitted(&mut self, now: Instant) -> Option<Duration> {
        self.evict_expired(now);

        let mut longest: Option<(Duration, u64, u32)> = None;
        for (period, limit) in &self.rules {
            let Some(timestamps) = self.history.get(period) else {
                continue;
            };
            if timestamps.len() < *limit as usize {
                continue;
            }
            let Some(&oldest) = timestamps.front() else {
                continue;
            };
            let wait = (oldest + Duration::from_secs(*period)).saturating_duration_since(now);
            if longest.map_or(true, |(w, _, _)| wait > w) {
                longest = Some((wait, *period, *limit));
            }
        }

        longest.map(|(wait, period, limit)| {
            tracing::info!(
                wait_secs = wait.as_secs_f64(),
                period,
                limit,
                "Rate limit reached, waiting before sending request"
            );
            wait
        })
    }

    /// Records a request under every period ever declared
    pub fn record(&mut self, now: Instant) {
        for timestamps in self.history.values_mut() {
            timestamps.push_back(now);
        }
    }

    /// Waits until one more request fits within every rule, then records it
    ///
    /// Returns the admission time, which the caller hands back to
    /// [`RateLimiter::update_rules`] if the response declares new rules.
    pub async fn admit(&mut self) -> Instant {
        loop {
            let now = Instant::now();
            match self.time_until_admitted(now) {
                Some(wait) if !wait.is_zero() => tokio::time::sleep(wait).await,
                Some(_) => tokio::task::yield_now().await,
                None => {
                    self.record(now);
                    return now;
                }
            }
        }
    }
}
