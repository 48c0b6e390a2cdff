//! Observability metrics for fetches and exports
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. [`init_metrics`] installs the Prometheus exporter.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Global exporter installation flag
static METRICS_INITIALIZED: Mutex<bool> = Mutex::new(false);

/// Install the Prometheus exporter and register metric descriptions.
///
/// Must be called from within a tokio runtime. Idempotent: later calls are
/// no-ops, whatever address they pass.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    let mut initialized = METRICS_INITIALIZED
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "HTTP attempts by outcome (status code or transport)"
    );
    describe_counter!(
        "http_retries_total",
        Unit::Count,
        "Retries scheduled after a retryable failure"
    );
    describe_counter!(
        "http_429_errors_total",
        Unit::Count,
        "Responses with status 429"
    );
    describe_histogram!(
        "retry_backoff_duration_seconds",
        Unit::Seconds,
        "Backoff or Retry-After delay before the next attempt"
    );
    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time spent waiting for a rate limit token"
    );
    describe_counter!(
        "export_rows_total",
        Unit::Count,
        "Data rows written to tabular files"
    );

    *initialized = true;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Whether [`init_metrics`] has installed the exporter
pub fn is_initialized() -> bool {
    *METRICS_INITIALIZED
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Record the outcome of one HTTP attempt.
///
/// `status` is `None` for transport failures.
pub fn record_request(status: Option<u16>) {
    let outcome = status.map_or_else(|| "transport".to_string(), |s| s.to_string());
    counter!("http_requests_total", "outcome" => outcome).increment(1);
    if status == Some(429) {
        counter!("http_429_errors_total").increment(1);
    }
}

/// Record a scheduled retry and the delay before it.
pub fn record_retry(delay: Duration) {
    counter!("http_retries_total").increment(1);
    histogram!("retry_backoff_duration_seconds").record(delay.as_secs_f64());
}

/// Record time spent waiting on the rate limiter.
pub fn record_rate_limit_wait(waited: Duration) {
    histogram!("rate_limit_wait_seconds").record(waited.as_secs_f64());
}

/// Record rows written by one export call.
pub fn record_export(base_name: &str, rows: u64) {
    counter!("export_rows_total", "file" => base_name.to_string()).increment(rows);
}

/// Metrics setup errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The exporter could not be installed
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}
