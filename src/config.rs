//! Fetch configuration constants and policies

use std::time::Duration;

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Stellar-Hackathon-Scraper/1.0";

/// Per-attempt request timeout (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP connect timeout (seconds) used by the reqwest transport.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default number of attempts per logical fetch.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default outbound request rate; also used as the burst capacity.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 2;

/// Linear backoff step in milliseconds: retry `n` waits `n * BACKOFF_STEP_MS`.
pub const BACKOFF_STEP_MS: u64 = 1000;

/// Linear backoff delay for the given retry number (1-based).
pub fn linear_backoff(step: Duration, retry: u32) -> Duration {
    step.saturating_mul(retry)
}

/// Token bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateBudget {
    /// Maximum burst (bucket size)
    pub capacity: u32,
    /// Tokens added per second
    pub refill_per_second: f64,
}

impl RateBudget {
    /// Create a budget, rejecting a zero capacity or a non-positive refill rate.
    pub fn new(capacity: u32, refill_per_second: f64) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::Invalid(
                "rate budget capacity must be at least 1".to_string(),
            ));
        }
        if !(refill_per_second.is_finite() && refill_per_second > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "refill rate must be positive, got {refill_per_second}"
            )));
        }
        Ok(Self {
            capacity,
            refill_per_second,
        })
    }

    /// Budget allowing `n` requests per second with a burst of `n`.
    pub fn per_second(n: u32) -> Result<Self, ConfigError> {
        Self::new(n, f64::from(n))
    }
}

impl Default for RateBudget {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_REQUESTS_PER_SECOND,
            refill_per_second: f64::from(DEFAULT_REQUESTS_PER_SECOND),
        }
    }
}

/// Retry behaviour for one logical fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (>= 1)
    pub max_attempts: u32,
    /// Linear backoff step
    pub backoff_step: Duration,
    /// Timeout applied to every single attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Policy with `max_attempts` attempts and the default step/timeout.
    pub fn new(max_attempts: u32) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            ..Self::default()
        })
    }

    /// Delay before the `retry`-th backoff (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        linear_backoff(self.backoff_step, retry)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: Duration::from_millis(BACKOFF_STEP_MS),
            attempt_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Everything a [`crate::fetcher::RetryingFetcher`] needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Value of the `User-Agent` header
    pub user_agent: String,
    /// Retry policy
    pub retry: RetryPolicy,
    /// Outbound rate budget
    pub rate: RateBudget,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
            rate: RateBudget::default(),
        }
    }
}

/// Invalid configuration values
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
