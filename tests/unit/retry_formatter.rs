use std::time::Duration;

use tabular_scraper::fetcher::{RetryContext, RetryErrorType, TransportErrorKind};

fn sample_context(error_type: RetryErrorType) -> RetryContext {
    RetryContext::new(
        2,
        5,
        error_type,
        Duration::from_secs(4),
        "https://api.test/pools",
    )
}

#[test]
fn format_retry_captures_attempt_and_wait() {
    let message = sample_context(RetryErrorType::ServerError(503)).format_retry();
    assert!(message.contains("attempt 3/5"), "{message}");
    assert!(message.contains("service unavailable"), "{message}");
    assert!(message.contains("4.0s"), "{message}");
    assert!(message.contains("https://api.test/pools"), "{message}");
}

#[test]
fn format_rate_limited_reports_wait() {
    let message = sample_context(RetryErrorType::RateLimit).format_rate_limited();
    assert!(message.starts_with("Rate limited, waiting 4.0s"), "{message}");
    assert!(message.contains("attempt 3/5"), "{message}");
}

#[test]
fn format_failure_includes_last_error() {
    let output = sample_context(RetryErrorType::ServerError(502)).format_failure("server error 502");
    assert!(output.contains("after 5 attempts"), "{output}");
    assert!(output.ends_with("server error 502"), "{output}");
}

#[test]
fn status_codes_classify_by_range() {
    assert_eq!(RetryErrorType::from_status(429), RetryErrorType::RateLimit);
    assert_eq!(RetryErrorType::from_status(500), RetryErrorType::ServerError(500));
    assert_eq!(RetryErrorType::from_status(599), RetryErrorType::ServerError(599));
    assert_eq!(RetryErrorType::from_status(404), RetryErrorType::ClientError(404));
    assert_eq!(RetryErrorType::from_status(301), RetryErrorType::ClientError(301));

    assert!(RetryErrorType::RateLimit.is_retryable());
    assert!(RetryErrorType::ServerError(500).is_retryable());
    assert!(!RetryErrorType::ClientError(404).is_retryable());
}

#[test]
fn transport_kinds_map_to_network_types() {
    assert_eq!(
        RetryErrorType::from_transport(TransportErrorKind::Timeout),
        RetryErrorType::NetworkTimeout
    );
    assert_eq!(
        RetryErrorType::from_transport(TransportErrorKind::Connect),
        RetryErrorType::NetworkOffline
    );
    assert_eq!(
        RetryErrorType::from_transport(TransportErrorKind::Other).description(),
        "network error"
    );
}
