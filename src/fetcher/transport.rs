//! HTTP transport seam used by the retrying fetcher
//!
//! A transport performs exactly one GET attempt and returns the fully read
//! response. [`ReqwestTransport`] is the production implementation; tests
//! plug in scripted transports.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, RETRY_AFTER, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

use crate::config::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};

/// One outbound GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Absolute URL
    pub url: String,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Per-attempt timeout
    pub timeout: Duration,
}

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw `Retry-After` header value, if present
    pub retry_after: Option<String>,
    /// Response body
    pub body: Bytes,
}

impl TransportResponse {
    /// Response with the given status and body and no `Retry-After`.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    /// Attach a `Retry-After` header value.
    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    /// Whether the status is 2xx
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// `Retry-After` interpreted strictly as an integer number of seconds.
    pub fn retry_after_delay(&self) -> Option<Duration> {
        parse_retry_after(self.retry_after.as_deref()?)
    }

    /// Body decoded as UTF-8, lossily
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Parse a `Retry-After` value as whole seconds. HTTP-dates are not accepted.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Kind of transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The attempt exceeded its timeout
    Timeout,
    /// The connection could not be established
    Connect,
    /// The request could not be built (never retried)
    InvalidRequest,
    /// Any other I/O failure, including body read errors
    Other,
}

/// Connection-level failure for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    /// Failure category
    pub kind: TransportErrorKind,
    /// Human readable detail
    pub message: String,
}

impl TransportError {
    /// Build an error of the given kind.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Timeout after `timeout`.
    pub fn timeout(timeout: Duration) -> Self {
        Self::new(
            TransportErrorKind::Timeout,
            format!("request timed out after {:.1}s", timeout.as_secs_f64()),
        )
    }

    fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_builder() {
            TransportErrorKind::InvalidRequest
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// Performs single HTTP attempts.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue one GET and read the whole body.
    async fn get(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client with connect and request timeouts.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                TransportError::new(
                    TransportErrorKind::InvalidRequest,
                    format!("failed to build HTTP client: {e}"),
                )
            })?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(&request.url)
            .header(USER_AGENT, &request.user_agent)
            .header(ACCEPT, "application/json")
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await.map_err(|e| {
            TransportError::new(
                TransportErrorKind::Other,
                format!("failed to read response body: {e}"),
            )
        })?;

        Ok(TransportResponse {
            status,
            retry_after,
            body,
        })
    }
}
