//! Retrying, rate-limited HTTP fetcher

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::cancel::CancelSignal;
use crate::config::{FetchConfig, RetryPolicy};
use crate::log::SharedLog;
use crate::metrics;
use crate::rate_limit::RateLimiter;

use super::retry_formatter::RetryContext;
use super::transport::{
    HttpTransport, ReqwestTransport, TransportError, TransportErrorKind, TransportRequest,
};
use super::{classify, FailureReason, FetchError, FetchOutcome, FetchResult};

/// Issues one logical GET with rate limiting and retries.
pub struct RetryingFetcher {
    transport: Arc<dyn HttpTransport>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    user_agent: String,
    log: SharedLog,
}

impl RetryingFetcher {
    /// Create a fetcher from its collaborators.
    ///
    /// # Arguments
    /// * `transport` - Performs single HTTP attempts
    /// * `limiter` - Shared rate limiter (one per quota)
    /// * `config` - User agent and retry policy; `config.rate` is ignored
    ///   because the limiter is supplied
    /// * `log` - Sink for retry warnings
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        limiter: Arc<RateLimiter>,
        config: &FetchConfig,
        log: SharedLog,
    ) -> Self {
        Self {
            transport,
            limiter,
            policy: config.retry,
            user_agent: config.user_agent.clone(),
            log,
        }
    }

    /// Create a fetcher backed by reqwest and a fresh limiter built from `config.rate`.
    pub fn from_config(config: &FetchConfig, log: SharedLog) -> Result<Self, TransportError> {
        let transport = Arc::new(ReqwestTransport::new()?);
        let limiter = Arc::new(RateLimiter::new(config.rate));
        Ok(Self::new(transport, limiter, config, log))
    }

    /// Replace the `User-Agent` header value.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Shared limiter handle, for fetchers that must share a quota
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Retry policy in effect
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch `url`, returning the body of the first successful attempt.
    ///
    /// # Errors
    /// * [`FetchError::Cancelled`] when `cancel` fires at any suspension point
    /// * [`FetchError::Fatal`] on a non-retryable status, without further attempts
    /// * [`FetchError::Exhausted`] when every attempt failed in a retryable way
    /// * [`FetchError::InvalidRequest`] when the URL cannot be requested at all
    pub async fn fetch(&self, url: &str, cancel: &CancelSignal) -> FetchResult<Bytes> {
        let max_attempts = self.policy.max_attempts.max(1);
        let request = TransportRequest {
            url: url.to_string(),
            user_agent: self.user_agent.clone(),
            timeout: self.policy.attempt_timeout,
        };

        let mut last_failure: Option<FailureReason> = None;
        let mut backoff_steps = 0u32;
        let mut waited_retry_after = false;

        for attempt in 1..=max_attempts {
            let cancelled = || FetchError::Cancelled {
                url: url.to_string(),
                attempts: attempt - 1,
            };

            self.limiter
                .acquire(cancel)
                .await
                .map_err(|_| cancelled())?;

            if attempt > 1 && !waited_retry_after {
                backoff_steps += 1;
                let delay = self.policy.backoff(backoff_steps);
                if let Some(reason) = &last_failure {
                    let ctx =
                        RetryContext::new(attempt - 1, max_attempts, reason.error_type(), delay, url);
                    self.log.warn(format_args!("{}", ctx.format_retry()));
                }
                metrics::record_retry(delay);
                if !sleep_or_cancel(delay, cancel).await {
                    return Err(cancelled());
                }
            }
            waited_retry_after = false;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(FetchError::Cancelled {
                        url: url.to_string(),
                        attempts: attempt,
                    })
                }
                result = timeout(self.policy.attempt_timeout, self.transport.get(&request)) => result,
            };

            let outcome = match result {
                Err(_elapsed) => {
                    metrics::record_request(None);
                    FetchOutcome::Retryable {
                        reason: FailureReason::Transport(TransportError::timeout(
                            self.policy.attempt_timeout,
                        )),
                        retry_after: None,
                    }
                }
                Ok(Err(err)) if err.kind == TransportErrorKind::InvalidRequest => {
                    return Err(FetchError::InvalidRequest {
                        url: url.to_string(),
                        reason: err.message,
                    });
                }
                Ok(Err(err)) => {
                    metrics::record_request(None);
                    FetchOutcome::Retryable {
                        reason: FailureReason::Transport(err),
                        retry_after: None,
                    }
                }
                Ok(Ok(response)) => {
                    metrics::record_request(Some(response.status));
                    classify(response)
                }
            };

            match outcome {
                FetchOutcome::Success(body) => {
                    self.log.debug(format_args!(
                        "Fetched {} bytes from {} on attempt {}/{}",
                        body.len(),
                        url,
                        attempt,
                        max_attempts
                    ));
                    return Ok(body);
                }
                FetchOutcome::Fatal { status, body } => {
                    return Err(FetchError::Fatal {
                        url: url.to_string(),
                        status,
                        body,
                    });
                }
                FetchOutcome::Retryable {
                    reason,
                    retry_after,
                } => {
                    if let (Some(delay), true) = (retry_after, attempt < max_attempts) {
                        let ctx =
                            RetryContext::new(attempt, max_attempts, reason.error_type(), delay, url);
                        self.log.warn(format_args!("{}", ctx.format_rate_limited()));
                        metrics::record_retry(delay);
                        if !sleep_or_cancel(delay, cancel).await {
                            return Err(FetchError::Cancelled {
                                url: url.to_string(),
                                attempts: attempt,
                            });
                        }
                        waited_retry_after = true;
                    }
                    last_failure = Some(reason);
                }
            }
        }

        let last = last_failure.unwrap_or_else(|| {
            FailureReason::Transport(TransportError::new(
                TransportErrorKind::Other,
                "no attempt completed",
            ))
        });
        let ctx = RetryContext::new(
            max_attempts,
            max_attempts,
            last.error_type(),
            Duration::ZERO,
            url,
        );
        self.log
            .warn(format_args!("{}", ctx.format_failure(&last.to_string())));

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts: max_attempts,
            last,
        })
    }
}

/// Sleep for `delay` unless `cancel` fires first. Returns `false` on cancellation.
async fn sleep_or_cancel(delay: Duration, cancel: &CancelSignal) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = sleep(delay) => true,
    }
}
