//! # Tabular Scraper Library
//!
//! Building blocks for polling JSON HTTP endpoints politely and exporting
//! collections of records as timestamped CSV files.
//!
//! ## Features
//!
//! - **Rate Limiting**: Token bucket shared by every request of a fetcher
//! - **Retries**: Linear backoff, per-attempt timeout, `Retry-After` aware 429 handling
//! - **Cancellation**: Rate-limit waits, backoff sleeps, and in-flight requests abort on cancel
//! - **Generic Export**: Any type implementing [`Record`] becomes a CSV row
//!
//! ## Quick Start
//!
//! ```no_run
//! use tabular_scraper::{
//!     tabular_record, CancelSignal, CsvExporter, FetchConfig, RetryingFetcher, TracingLog,
//! };
//!
//! struct Price {
//!     symbol: String,
//!     price: Option<f64>,
//! }
//!
//! tabular_record!(Price { symbol => "symbol", price => "price_usd" });
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = RetryingFetcher::from_config(&FetchConfig::default(), TracingLog::shared())?;
//! let body = fetcher
//!     .fetch("https://api.example.com/prices", &CancelSignal::new())
//!     .await?;
//! # let _ = body;
//!
//! let prices = vec![Price { symbol: "SOL".to_string(), price: None }];
//! let artifact = CsvExporter::new("data", TracingLog::shared()).export(&prices, "prices")?;
//! println!("{} rows in {}", artifact.row_count, artifact.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`rate_limit`] - token bucket limiter
//! - [`fetcher`] - retrying GET over a pluggable HTTP transport
//! - [`output`] - record description, schema derivation, CSV writing, file naming
//! - [`cancel`] - cooperative cancellation signal
//! - [`log`] - injectable log sink
//! - [`config`] - defaults and validated fetch configuration
//! - [`metrics`] - Prometheus counters and histograms
//! - [`cli`] - the `tabular-scraper` command line

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Cooperative cancellation
pub mod cancel;

/// CLI command implementations
pub mod cli;

/// Defaults and fetch configuration
pub mod config;

/// Retrying HTTP fetcher
pub mod fetcher;

/// Injectable logging
pub mod log;

/// Prometheus metrics
pub mod metrics;

/// Tabular output
pub mod output;

/// Token bucket rate limiter
pub mod rate_limit;

// Re-export commonly used types
pub use cancel::CancelSignal;
pub use config::{FetchConfig, RateBudget, RetryPolicy};
pub use fetcher::{FetchError, FetchResult, HttpTransport, RetryingFetcher};
pub use log::{LogLevel, LogSink, MemoryLog, SharedLog, TracingLog};
pub use output::{
    CollisionPolicy, CsvExporter, ExportArtifact, Field, FieldValue, OutputError, Record, Schema,
    TabularWriter, ToField,
};
pub use rate_limit::{RateLimitError, RateLimiter};
