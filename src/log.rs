//! Leveled logging capability injected into the fetcher and exporter.
//!
//! Production code uses [`TracingLog`], which forwards to `tracing`. Tests use
//! [`MemoryLog`] to assert on emitted entries without a global subscriber.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Severity of a log entry. The core never logs above `Warn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Diagnostic detail
    Debug,
    /// Normal progress
    Info,
    /// Retries, rate-limit waits, empty exports
    Warn,
}

/// Fire-and-forget log sink. Implementations must not block or panic.
pub trait LogSink: Send + Sync {
    /// Emit one entry.
    fn log(&self, level: LogLevel, args: fmt::Arguments<'_>);

    /// Emit a debug entry.
    fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    /// Emit an info entry.
    fn info(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    /// Emit a warning entry.
    fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }
}

/// Shared handle to a log sink.
pub type SharedLog = Arc<dyn LogSink>;

/// Sink forwarding to the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl TracingLog {
    /// Shared handle for injection.
    pub fn shared() -> SharedLog {
        Arc::new(Self)
    }
}

impl LogSink for TracingLog {
    fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        match level {
            LogLevel::Debug => tracing::debug!("{}", args),
            LogLevel::Info => tracing::info!("{}", args),
            LogLevel::Warn => tracing::warn!("{}", args),
        }
    }
}

/// Sink that records entries in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLog {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded entry.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages recorded at exactly `level`.
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl LogSink for MemoryLog {
    fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        // a poisoned lock drops the entry rather than propagating a panic
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, args.to_string()));
        }
    }
}
