//! CSV writer and the generic exporter

use ::csv::{QuoteStyle, Writer, WriterBuilder};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::path::{sanitize_base_name, CollisionPolicy, FileSink};
use super::record::Record;
use super::schema::Schema;
use super::{ExportArtifact, OutputError, OutputResult};
use crate::log::SharedLog;
use crate::metrics;

/// Flush interval (rows).
const FLUSH_INTERVAL: u64 = 1_000;

/// Render every record into cells using `schema`.
pub fn render<R: Record>(records: &[R], schema: &Schema) -> OutputResult<Vec<Vec<String>>> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| schema.render_row(record, row))
        .collect()
}

/// Comma-delimited writer over any byte sink.
///
/// Fields containing a comma, quote, or line break are quoted with internal
/// quotes doubled. A row made of a single empty field is written as `""` so
/// readers do not skip it as a blank line.
pub struct TabularWriter<W: Write> {
    writer: Writer<W>,
    rows_written: u64,
}

impl<W: Write> TabularWriter<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        let writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .from_writer(inner);
        Self {
            writer,
            rows_written: 0,
        }
    }

    /// Write the header row.
    pub fn write_header(&mut self, schema: &Schema) -> OutputResult<()> {
        self.writer
            .write_record(schema.headers())
            .map_err(|e| OutputError::Write(format!("Failed to write headers: {}", e)))
    }

    /// Write one data row.
    pub fn write_row<I, T>(&mut self, cells: I) -> OutputResult<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(cells).map_err(|e| {
            OutputError::Write(format!("Failed to write row {}: {}", self.rows_written, e))
        })?;
        self.rows_written += 1;

        if self.rows_written % FLUSH_INTERVAL == 0 {
            self.flush()?;
        }
        Ok(())
    }

    /// Data rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush buffered rows to the inner sink.
    pub fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::Write(format!("Failed to flush: {}", e)))
    }

    /// Flush and hand back the inner sink.
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::Write(format!("Failed to flush: {}", e.error())))
    }
}

/// Exports homogeneous record collections to timestamped CSV files.
pub struct CsvExporter {
    output_dir: PathBuf,
    collision: CollisionPolicy,
    log: SharedLog,
}

impl CsvExporter {
    /// Create an exporter writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, log: SharedLog) -> Self {
        Self {
            output_dir: output_dir.into(),
            collision: CollisionPolicy::default(),
            log,
        }
    }

    /// Set the collision policy.
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision = policy;
        self
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Export `records` to `<output_dir>/<base_name>_<now>.csv`.
    pub fn export<R: Record>(&self, records: &[R], base_name: &str) -> OutputResult<ExportArtifact> {
        self.export_at(records, base_name, Local::now())
    }

    /// Export with an explicit capture time.
    ///
    /// The schema is derived from the first record; every later record must
    /// describe the same fields or the call fails with
    /// [`OutputError::ShapeMismatch`]. An empty collection is not an error:
    /// an empty file is created and a warning logged.
    pub fn export_at<R: Record>(
        &self,
        records: &[R],
        base_name: &str,
        captured_at: DateTime<Local>,
    ) -> OutputResult<ExportArtifact> {
        let sink = FileSink::open(&self.output_dir, base_name, captured_at, self.collision)?;

        let Some(first) = records.first() else {
            self.log
                .warn(format_args!("No data to export for {}", base_name));
            let path = sink.close()?;
            return Ok(self.artifact(base_name, captured_at, path, 0));
        };

        let schema = Schema::derive(first);
        if schema.is_empty() {
            self.log.warn(format_args!(
                "Records for {} have no exported fields; writing an empty file",
                base_name
            ));
            let path = sink.close()?;
            return Ok(self.artifact(base_name, captured_at, path, 0));
        }

        let mut writer = TabularWriter::new(sink);
        writer.write_header(&schema)?;
        for (row, record) in records.iter().enumerate() {
            let cells = schema.render_row(record, row)?;
            writer.write_row(&cells)?;
        }

        let row_count = writer.rows_written();
        let path = writer.into_inner()?.close()?;

        metrics::record_export(base_name, row_count);
        self.log.info(format_args!(
            "Exported {} records to {}",
            row_count,
            path.display()
        ));

        Ok(self.artifact(base_name, captured_at, path, row_count))
    }

    fn artifact(
        &self,
        base_name: &str,
        captured_at: DateTime<Local>,
        path: PathBuf,
        row_count: u64,
    ) -> ExportArtifact {
        ExportArtifact {
            output_dir: self.output_dir.clone(),
            base_name: sanitize_base_name(base_name),
            captured_at,
            path,
            row_count,
        }
    }
}
