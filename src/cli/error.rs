//! CLI error types and conversions

use crate::config::ConfigError;
use crate::fetcher::{FetchError, TransportError};
use crate::metrics::MetricsError;
use crate::output::OutputError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Fetch error
    #[error("fetch error: {0}")]
    FetchError(#[from] FetchError),

    /// HTTP client could not be built
    #[error("transport error: {0}")]
    TransportError(#[from] TransportError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(#[from] ConfigError),

    /// Metrics exporter error
    #[error("metrics error: {0}")]
    MetricsError(#[from] MetricsError),

    /// Several fetches of a batch failed
    #[error("{failed} of {total} fetches failed; first error: {first}")]
    FetchesFailed {
        /// Failed fetches
        failed: usize,
        /// Fetches attempted
        total: usize,
        /// First failure in URL order
        #[source]
        first: FetchError,
    },

    /// Input document is unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}
