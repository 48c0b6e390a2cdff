//! `export` command: decode a JSON array of objects and write it as CSV
//!
//! This is a generic record supplier: columns come from the keys of the first
//! object, in document order. Later objects are read through the same key
//! list, so missing keys become empty cells and extra keys are dropped.

use bytes::Bytes;
use clap::Args;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::warn;

use crate::cancel::CancelSignal;
use crate::fetcher::RetryingFetcher;
use crate::log::TracingLog;
use crate::output::{CsvExporter, ExportArtifact, Field, FieldValue, Record};

use super::{Cli, CliError};

/// Arguments of the `export` command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// JSON file to read
    #[arg(long, required_unless_present = "url", conflicts_with = "url")]
    pub input: Option<PathBuf>,

    /// URL to fetch the JSON document from
    #[arg(long)]
    pub url: Option<String>,

    /// JSON pointer to the array inside the document (e.g. /data/pools)
    #[arg(long)]
    pub pointer: Option<String>,

    /// Base name of the output file
    #[arg(long)]
    pub name: String,

    /// Print a JSON summary of the export instead of just the path
    #[arg(long)]
    pub summary: bool,
}

impl ExportArgs {
    /// Load the document, export it, and print the resulting path.
    pub async fn execute(&self, cli: &Cli, cancel: CancelSignal) -> Result<ExportArtifact, CliError> {
        let document = self.load(cli, &cancel).await?;
        let table = JsonTable::parse(&document, self.pointer.as_deref())?;

        let exporter = CsvExporter::new(&cli.output_dir, TracingLog::shared())
            .with_collision_policy(cli.collision);
        let artifact = exporter.export(&table.rows(), &self.name)?;

        if self.summary {
            let summary = serde_json::to_string(&artifact)
                .map_err(|e| CliError::Io(format!("Failed to encode summary: {}", e)))?;
            println!("{summary}");
        } else {
            println!("{}", artifact.path.display());
        }
        Ok(artifact)
    }

    async fn load(&self, cli: &Cli, cancel: &CancelSignal) -> Result<Bytes, CliError> {
        if let Some(url) = &self.url {
            let fetcher = RetryingFetcher::from_config(&cli.fetch_config()?, TracingLog::shared())?;
            return Ok(fetcher.fetch(url, cancel).await?);
        }

        let path = self
            .input
            .as_ref()
            .ok_or_else(|| CliError::InvalidInput("either --input or --url is required".to_string()))?;
        std::fs::read(path)
            .map(Bytes::from)
            .map_err(|e| CliError::Io(format!("Failed to read {}: {}", path.display(), e)))
    }
}

/// Decoded array of JSON objects with a fixed column order.
#[derive(Debug)]
pub struct JsonTable {
    columns: Vec<String>,
    objects: Vec<Map<String, Value>>,
}

impl JsonTable {
    /// Decode `bytes` and select the array at `pointer` (the root if `None`).
    pub fn parse(bytes: &[u8], pointer: Option<&str>) -> Result<Self, CliError> {
        let document: Value = serde_json::from_slice(bytes)
            .map_err(|e| CliError::InvalidInput(format!("Invalid JSON: {e}")))?;

        let selected = match pointer {
            Some(p) => document
                .pointer(p)
                .ok_or_else(|| CliError::InvalidInput(format!("JSON pointer {p} not found")))?,
            None => &document,
        };

        let items = selected
            .as_array()
            .ok_or_else(|| CliError::InvalidInput("expected a JSON array".to_string()))?;

        let objects = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object().cloned().ok_or_else(|| {
                    CliError::InvalidInput(format!("element {i} is not a JSON object"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let columns: Vec<String> = objects
            .first()
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();

        let extra = objects
            .iter()
            .filter(|object| object.keys().any(|key| !columns.contains(key)))
            .count();
        if extra > 0 {
            warn!(
                "{} records carry keys not present in the first record; extra keys are ignored",
                extra
            );
        }

        Ok(Self { columns, objects })
    }

    /// Column names in output order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows viewed as records.
    pub fn rows(&self) -> Vec<JsonRow<'_>> {
        self.objects
            .iter()
            .map(|values| JsonRow {
                columns: &self.columns,
                values,
            })
            .collect()
    }
}

/// One JSON object seen through the table's column list.
#[derive(Debug, Clone, Copy)]
pub struct JsonRow<'a> {
    columns: &'a [String],
    values: &'a Map<String, Value>,
}

impl Record for JsonRow<'_> {
    fn describe_fields(&self) -> Vec<Field<'_>> {
        self.columns
            .iter()
            .map(|column| Field::new(column.as_str(), json_value(self.values.get(column))))
            .collect()
    }
}

fn json_value(value: Option<&Value>) -> FieldValue<'_> {
    match value {
        None | Some(Value::Null) => FieldValue::Null,
        Some(Value::String(s)) => FieldValue::Text(Cow::Borrowed(s.as_str())),
        Some(Value::Bool(b)) => FieldValue::Bool(*b),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                FieldValue::UInt(u)
            } else {
                FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Some(Value::Array(items)) => {
            FieldValue::List(items.iter().map(|item| json_value(Some(item))).collect())
        }
        Some(object @ Value::Object(_)) => FieldValue::Other(object.to_string()),
    }
}
