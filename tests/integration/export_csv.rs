//! Integration tests for CSV export of record collections

use chrono::{DateTime, Local, TimeZone};
use std::sync::Arc;
use tabular_scraper::output::{CollisionPolicy, Field, FieldValue, OutputError, Record};
use tabular_scraper::{tabular_record, CsvExporter, LogLevel, MemoryLog};
use tempfile::TempDir;

struct Price {
    symbol: String,
    price: Option<f64>,
    volume: u64,
}

tabular_record!(Price {
    symbol => "symbol",
    price => "price_usd",
    volume => "volume_24h",
});

struct Pool {
    name: String,
    tags: Vec<String>,
    internal_id: u32,
}

tabular_record!(Pool {
    name => "pool_name",
    tags => "tags",
    internal_id => "-",
});

fn captured_at() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).single().unwrap()
}

fn read_rows(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn test_file_name_embeds_base_and_timestamp() {
    let temp = TempDir::new().unwrap();
    let exporter = CsvExporter::new(temp.path(), Arc::new(MemoryLog::new()));

    let rows = vec![Price {
        symbol: "XLM".to_string(),
        price: Some(0.125),
        volume: 10,
    }];
    let artifact = exporter.export_at(&rows, "prices", captured_at()).unwrap();

    assert_eq!(
        artifact.path,
        temp.path().join("prices_2024-03-09_14-05-07.csv")
    );
    assert_eq!(artifact.row_count, 1);
    assert_eq!(artifact.captured_at, captured_at());
}

#[test]
fn test_header_uses_tags_in_declaration_order() {
    let temp = TempDir::new().unwrap();
    let exporter = CsvExporter::new(temp.path(), Arc::new(MemoryLog::new()));

    let rows = vec![
        Price {
            symbol: "XLM".to_string(),
            price: Some(0.125),
            volume: 10,
        },
        Price {
            symbol: "SOL".to_string(),
            price: None,
            volume: 0,
        },
    ];
    let artifact = exporter.export(&rows, "prices").unwrap();

    let text = std::fs::read_to_string(&artifact.path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "symbol,price_usd,volume_24h");
    assert_eq!(lines[1], "XLM,0.125000,10");
    assert_eq!(lines[2], "SOL,,0");
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_lists_render_bracketed_and_excluded_fields_are_skipped() {
    let temp = TempDir::new().unwrap();
    let exporter = CsvExporter::new(temp.path(), Arc::new(MemoryLog::new()));

    let rows = vec![Pool {
        name: "XLM/USDC".to_string(),
        tags: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        internal_id: 7,
    }];
    let artifact = exporter.export(&rows, "pools").unwrap();

    let rows = read_rows(&artifact.path);
    assert_eq!(rows[0], vec!["pool_name", "tags"]);
    assert_eq!(rows[1], vec!["XLM/USDC", "[a,b,c]"]);

    let text = std::fs::read_to_string(&artifact.path).unwrap();
    assert!(text.contains("\"[a,b,c]\""), "{text}");
}

#[test]
fn test_empty_collection_creates_empty_file_and_warns() {
    let temp = TempDir::new().unwrap();
    let log = Arc::new(MemoryLog::new());
    let exporter = CsvExporter::new(temp.path(), log.clone());

    let rows: Vec<Price> = Vec::new();
    let artifact = exporter.export(&rows, "prices").unwrap();

    assert_eq!(artifact.row_count, 0);
    assert!(artifact.path.exists());
    assert_eq!(std::fs::metadata(&artifact.path).unwrap().len(), 0);
    assert_eq!(
        log.messages_at(LogLevel::Warn),
        vec!["No data to export for prices".to_string()]
    );
    assert!(log.messages_at(LogLevel::Info).is_empty());
}

#[test]
fn test_output_directory_is_created() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("data").join("daily");
    let exporter = CsvExporter::new(&nested, Arc::new(MemoryLog::new()));

    let rows = vec![Price {
        symbol: "XLM".to_string(),
        price: None,
        volume: 1,
    }];
    let artifact = exporter.export(&rows, "prices").unwrap();

    assert!(nested.is_dir());
    assert!(artifact.path.starts_with(&nested));
}

#[test]
fn test_suffix_policy_keeps_both_files() {
    let temp = TempDir::new().unwrap();
    let exporter = CsvExporter::new(temp.path(), Arc::new(MemoryLog::new()))
        .with_collision_policy(CollisionPolicy::Suffix);
    let rows = vec![Price {
        symbol: "XLM".to_string(),
        price: None,
        volume: 1,
    }];

    let first = exporter.export_at(&rows, "prices", captured_at()).unwrap();
    let second = exporter.export_at(&rows, "prices", captured_at()).unwrap();

    assert_ne!(first.path, second.path);
    assert!(first.path.exists() && second.path.exists());
    assert_eq!(
        second.path.file_name().unwrap(),
        "prices_2024-03-09_14-05-07_1.csv"
    );
}

enum Mixed {
    Short(String),
    Long(String, i64),
}

impl Record for Mixed {
    fn describe_fields(&self) -> Vec<Field<'_>> {
        match self {
            Mixed::Short(a) => vec![Field::new("a", FieldValue::Text(a.as_str().into()))],
            Mixed::Long(a, b) => vec![
                Field::new("a", FieldValue::Text(a.as_str().into())),
                Field::new("b", FieldValue::Int(*b)),
            ],
        }
    }
}

#[test]
fn test_mixed_shapes_are_rejected() {
    let temp = TempDir::new().unwrap();
    let exporter = CsvExporter::new(temp.path(), Arc::new(MemoryLog::new()));

    let rows = vec![Mixed::Short("x".to_string()), Mixed::Long("y".to_string(), 1)];
    let err = exporter.export(&rows, "mixed").unwrap_err();

    assert!(
        matches!(err, OutputError::ShapeMismatch { row: 1, .. }),
        "{err:?}"
    );
}

#[test]
fn test_unsafe_base_name_stays_inside_output_dir() {
    let temp = TempDir::new().unwrap();
    let exporter = CsvExporter::new(temp.path(), Arc::new(MemoryLog::new()));
    let rows = vec![Price {
        symbol: "XLM".to_string(),
        price: None,
        volume: 1,
    }];

    let artifact = exporter.export(&rows, "../escape").unwrap();

    assert_eq!(artifact.path.parent().unwrap(), temp.path());
    assert!(artifact.base_name.starts_with("__"));
}
