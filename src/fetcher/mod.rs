//! Resilient fetching of remote JSON documents
//!
//! [`RetryingFetcher`] turns one logical GET into up to `max_attempts` HTTP
//! attempts. Every attempt first takes a token from the shared
//! [`crate::rate_limit::RateLimiter`]; responses are classified with
//! [`classify`] into success, retryable failure, or fatal failure.
//!
//! | Outcome | Handling |
//! |---|---|
//! | transport error / timeout | retry after linear backoff |
//! | 2xx | return the body |
//! | 429 + `Retry-After: n` | wait `n` seconds, retry without advancing backoff |
//! | 429 without usable header | retry after linear backoff |
//! | 5xx | retry after linear backoff |
//! | anything else | fail immediately with status and body |

use bytes::Bytes;
use std::time::Duration;

pub mod client;
pub mod retry_formatter;
pub mod transport;

pub use client::RetryingFetcher;
pub use retry_formatter::{RetryContext, RetryErrorType};
pub use transport::{
    HttpTransport, ReqwestTransport, TransportError, TransportErrorKind, TransportRequest,
    TransportResponse,
};

/// Reason a single attempt failed in a retryable way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    /// Connection failure, timeout, or body read error
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// HTTP 429
    #[error("rate limited (429)")]
    RateLimited,

    /// HTTP 5xx
    #[error("server error: {0}")]
    Server(u16),
}

impl FailureReason {
    /// Classification used in log messages.
    pub fn error_type(&self) -> RetryErrorType {
        match self {
            Self::Transport(err) => RetryErrorType::from_transport(err.kind),
            Self::RateLimited => RetryErrorType::RateLimit,
            Self::Server(status) => RetryErrorType::ServerError(*status),
        }
    }
}

/// Result of classifying one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx with its body
    Success(Bytes),
    /// Worth another attempt; `retry_after` is set for 429s with a usable header
    Retryable {
        /// What went wrong
        reason: FailureReason,
        /// Server-requested delay
        retry_after: Option<Duration>,
    },
    /// Not retried
    Fatal {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },
}

/// Classify a fully read response.
pub fn classify(response: TransportResponse) -> FetchOutcome {
    if response.is_success() {
        return FetchOutcome::Success(response.body);
    }

    match RetryErrorType::from_status(response.status) {
        RetryErrorType::RateLimit => FetchOutcome::Retryable {
            retry_after: response.retry_after_delay(),
            reason: FailureReason::RateLimited,
        },
        RetryErrorType::ServerError(status) => FetchOutcome::Retryable {
            reason: FailureReason::Server(status),
            retry_after: None,
        },
        _ => FetchOutcome::Fatal {
            status: response.status,
            body: response.body_text(),
        },
    }
}

/// Fetch errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The cancellation signal fired
    #[error("fetch of {url} cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Requested URL
        url: String,
        /// Attempts issued before cancellation
        attempts: u32,
    },

    /// Non-retryable HTTP status
    #[error("request to {url} failed with status {status}: {body}")]
    Fatal {
        /// Requested URL
        url: String,
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },

    /// Every attempt failed
    #[error("max retries exceeded for {url} after {attempts} attempts: {last}")]
    Exhausted {
        /// Requested URL
        url: String,
        /// Attempts issued
        attempts: u32,
        /// Last observed failure
        #[source]
        last: FailureReason,
    },

    /// The request could not be built (malformed URL)
    #[error("invalid request for {url}: {reason}")]
    InvalidRequest {
        /// Requested URL
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

impl FetchError {
    /// HTTP status for fatal failures
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fatal { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;
