//! Column schema derived from a sample record

use super::record::{Field, Record};
use super::{OutputError, OutputResult};

/// One output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Header text
    pub header: String,
    /// Position of the field in [`Record::describe_fields`]
    pub index: usize,
}

/// Ordered columns for one export call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<Column>,
    field_count: usize,
}

impl Schema {
    /// Derive the schema from `sample`, keeping exported fields in declaration order.
    pub fn derive<R: Record + ?Sized>(sample: &R) -> Self {
        let fields = sample.describe_fields();
        let columns = fields
            .iter()
            .enumerate()
            .filter_map(|(index, field)| {
                field.export_name().map(|name| Column {
                    header: name.to_string(),
                    index,
                })
            })
            .collect();

        Self {
            columns,
            field_count: fields.len(),
        }
    }

    /// Columns in output order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Header row
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no field is exported
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Render one record into cells, checking it has the sampled shape.
    ///
    /// `row` is only used for error reporting.
    pub fn render_row<R: Record + ?Sized>(&self, record: &R, row: usize) -> OutputResult<Vec<String>> {
        let fields = record.describe_fields();
        if fields.len() != self.field_count {
            return Err(OutputError::ShapeMismatch {
                row,
                reason: format!(
                    "expected {} fields, found {}",
                    self.field_count,
                    fields.len()
                ),
            });
        }

        self.columns
            .iter()
            .map(|column| {
                let field: &Field<'_> = &fields[column.index];
                match field.export_name() {
                    Some(name) if name == column.header => Ok(field.value.render()),
                    other => Err(OutputError::ShapeMismatch {
                        row,
                        reason: format!(
                            "column {} expected field '{}', found {:?}",
                            column.index, column.header, other
                        ),
                    }),
                }
            })
            .collect()
    }
}
