//! Integration tests for logging through tracing

use std::io::Write;
use std::sync::{Arc, Mutex};
use tabular_scraper::{LogSink, TracingLog};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_tracing_log_forwards_levels() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("tabular_scraper=debug"))
        .with_writer(captured.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let log = TracingLog;
        log.debug(format_args!("fetched {} bytes", 12));
        log.info(format_args!("Exported {} records", 3));
        log.warn(format_args!("No data to export for {}", "prices"));
    });

    let text = captured.text();
    assert!(text.contains("DEBUG") && text.contains("fetched 12 bytes"), "{text}");
    assert!(text.contains("INFO") && text.contains("Exported 3 records"), "{text}");
    assert!(text.contains("WARN") && text.contains("No data to export for prices"), "{text}");
}

#[test]
fn test_filter_suppresses_debug() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("tabular_scraper=info"))
        .with_writer(captured.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        TracingLog.debug(format_args!("hidden detail"));
        TracingLog.info(format_args!("visible summary"));
    });

    let text = captured.text();
    assert!(!text.contains("hidden detail"), "{text}");
    assert!(text.contains("visible summary"), "{text}");
}

#[test]
fn test_json_format() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("tabular_scraper=info"))
        .with_writer(captured.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        TracingLog.warn(format_args!("Rate limited, waiting 2.0s"));
    });

    let line = captured.text();
    let event: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(event["level"], "WARN");
    assert_eq!(event["fields"]["message"], "Rate limited, waiting 2.0s");
}
