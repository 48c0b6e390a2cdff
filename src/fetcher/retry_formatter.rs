//! Retry classification and log message formatting.
//!
//! Keeps the wording of retry warnings and final failure summaries in one
//! place so every fetch reports attempts the same way.

use std::time::Duration;

use super::transport::TransportErrorKind;

/// Classification of a failed attempt for user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Attempt timed out
    NetworkTimeout,
    /// Connection refused, DNS failure, or other offline scenarios
    NetworkOffline,
    /// HTTP 429
    RateLimit,
    /// HTTP 5xx
    ServerError(u16),
    /// Any other non-success status (never retried)
    ClientError(u16),
    /// Generic transport failure
    NetworkGeneric,
}

impl RetryErrorType {
    /// Classify an HTTP status code that is not 2xx.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimit,
            s if s >= 500 => Self::ServerError(s),
            s => Self::ClientError(s),
        }
    }

    /// Classify a transport failure.
    pub fn from_transport(kind: TransportErrorKind) -> Self {
        match kind {
            TransportErrorKind::Timeout => Self::NetworkTimeout,
            TransportErrorKind::Connect => Self::NetworkOffline,
            TransportErrorKind::InvalidRequest | TransportErrorKind::Other => Self::NetworkGeneric,
        }
    }

    /// Short description used inside retry log messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::RateLimit => "rate limit exceeded",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::ClientError(code) => match code {
                400 => "invalid request",
                401 | 403 => "authentication failed",
                404 => "resource not found",
                _ => "client error",
            },
            Self::NetworkGeneric => "network error",
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ClientError(_))
    }
}

/// Context for formatting retry messages.
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Number of the attempt that just failed (1-based)
    pub attempt: u32,
    /// Maximum number of attempts configured
    pub max_attempts: u32,
    /// Why the attempt failed
    pub error_type: RetryErrorType,
    /// Delay before the next attempt
    pub delay: Duration,
    /// URL being fetched
    pub url: String,
}

impl RetryContext {
    /// Build a context.
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        error_type: RetryErrorType,
        delay: Duration,
        url: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            error_type,
            delay,
            url: url.into(),
        }
    }

    /// Standard retry warning, e.g.
    /// `Retry attempt 2/3 after 1.0s (server error) for https://…`
    pub fn format_retry(&self) -> String {
        format!(
            "Retry attempt {}/{} after {:.1}s ({}) for {}",
            self.attempt + 1,
            self.max_attempts,
            self.delay.as_secs_f64(),
            self.error_type.description(),
            self.url
        )
    }

    /// Warning emitted when honouring a `Retry-After` header.
    pub fn format_rate_limited(&self) -> String {
        format!(
            "Rate limited, waiting {:.1}s before attempt {}/{} for {}",
            self.delay.as_secs_f64(),
            self.attempt + 1,
            self.max_attempts,
            self.url
        )
    }

    /// Summary once every attempt is used up.
    pub fn format_failure(&self, last_error: &str) -> String {
        format!(
            "Giving up on {} after {} attempts: {}",
            self.url, self.max_attempts, last_error
        )
    }
}
