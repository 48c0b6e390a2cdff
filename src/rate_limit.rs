//! Token-bucket rate limiting for outbound requests
//!
//! The bucket starts full and refills continuously at the configured rate up
//! to its capacity. One token admits one HTTP attempt. A single limiter is
//! shared (via `Arc`) by every fetch that must respect the same quota.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::cancel::CancelSignal;
use crate::config::RateBudget;
use crate::metrics;

/// Rounding slack when comparing fractional token counts.
const TOKEN_EPSILON: f64 = 1e-9;

/// Longest single sleep in [`RateLimiter::acquire`]; the bucket is re-checked after it.
pub const MAX_TOKEN_WAIT: Duration = Duration::from_secs(3600);

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket admission control, safe for concurrent use.
#[derive(Debug)]
pub struct RateLimiter {
    budget: RateBudget,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a limiter with a full bucket.
    pub fn new(budget: RateBudget) -> Self {
        Self {
            budget,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(budget.capacity),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Budget this limiter enforces
    pub fn budget(&self) -> RateBudget {
        self.budget
    }

    /// Tokens currently available (after refilling up to now).
    pub fn available(&self) -> f64 {
        let mut bucket = self.lock();
        self.refill(&mut bucket, Instant::now());
        bucket.tokens
    }

    /// Take a token if one is available right now.
    ///
    /// # Returns
    /// `Err(wait)` with the time until the next token when the bucket is empty
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut bucket = self.lock();
        self.refill(&mut bucket, Instant::now());

        if bucket.tokens + TOKEN_EPSILON >= 1.0 {
            bucket.tokens = (bucket.tokens - 1.0).max(0.0);
            return Ok(());
        }

        let missing = 1.0 - bucket.tokens;
        Err(self.wait_for(missing))
    }

    /// Time until `missing` tokens have refilled, capped at [`MAX_TOKEN_WAIT`].
    fn wait_for(&self, missing: f64) -> Duration {
        let rate = self.budget.refill_per_second;
        if !(rate.is_finite() && rate > 0.0) {
            return MAX_TOKEN_WAIT;
        }
        Duration::try_from_secs_f64(missing / rate)
            .map_or(MAX_TOKEN_WAIT, |wait| wait.min(MAX_TOKEN_WAIT))
    }

    /// Wait for a token.
    ///
    /// Returns [`RateLimitError::Cancelled`] without consuming a token if
    /// `cancel` fires before one becomes available.
    pub async fn acquire(&self, cancel: &CancelSignal) -> Result<(), RateLimitError> {
        if cancel.is_cancelled() {
            return Err(RateLimitError::Cancelled);
        }

        let started = Instant::now();
        loop {
            match self.try_acquire() {
                Ok(()) => {
                    metrics::record_rate_limit_wait(started.elapsed());
                    return Ok(());
                }
                Err(wait) => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(RateLimitError::Cancelled),
                        _ = sleep(wait) => {}
                    }
                }
            }
        }
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let rate = self.budget.refill_per_second;
        if rate.is_finite() && rate > 0.0 {
            let added = elapsed.as_secs_f64() * rate;
            bucket.tokens = (bucket.tokens + added).min(f64::from(self.budget.capacity));
        }
        bucket.last_refill = now;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Bucket> {
        // the bucket holds plain numbers, so a poisoned state is still usable
        self.bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Rate limiter errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RateLimitError {
    /// The cancellation signal fired while waiting for a token
    #[error("cancelled while waiting for a rate limit token")]
    Cancelled,
}
