//! Tabular export of record collections
//!
//! # Architecture
//!
//! - [`Record`] - capability every exportable type implements
//! - [`Schema`] - ordered columns derived once per export from the first record
//! - [`TabularWriter`] - CSV encoding of header and rows
//! - [`FileSink`] - timestamped output file inside the output directory
//! - [`CsvExporter`] - ties the above together and returns an [`ExportArtifact`]

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;

pub mod csv;
pub mod path;
pub mod record;
pub mod schema;

pub use self::csv::{render, CsvExporter, TabularWriter};
pub use path::{file_name, sanitize_base_name, CollisionPolicy, FileSink, TIMESTAMP_FORMAT};
pub use record::{Field, FieldValue, Record, ToField, EXCLUDED_TAG};
pub use schema::{Column, Schema};

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Output directory or file could not be created
    #[error("configuration error: {0}")]
    Config(String),

    /// Writing header, rows, or flushing failed (a partial file may remain)
    #[error("write error: {0}")]
    Write(String),

    /// A record does not match the schema derived from the first record
    #[error("record {row} does not match the export schema: {reason}")]
    ShapeMismatch {
        /// Zero-based index of the offending record
        row: usize,
        /// What differed
        reason: String,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Finished export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    /// Directory the file was written to
    pub output_dir: PathBuf,
    /// Sanitized base name
    pub base_name: String,
    /// Capture time embedded in the file name
    pub captured_at: DateTime<Local>,
    /// Full path of the written file
    pub path: PathBuf,
    /// Number of data rows (header excluded)
    pub row_count: u64,
}
