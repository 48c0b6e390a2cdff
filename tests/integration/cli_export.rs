//! End-to-end tests of the `tabular-scraper` binary

use assert_cmd::Command;
use tempfile::TempDir;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("tabular-scraper").unwrap();
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn export_from_file_writes_csv_and_prints_path() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("pools.json");
    std::fs::write(
        &input,
        r#"{"data":[{"pool":"XLM/USDC","tvl":1250.5,"tags":["amm","stable"]},{"pool":"SOL/USDC","tvl":null,"tags":[]}]}"#,
    )
    .unwrap();
    let out_dir = temp.path().join("out");

    let output = cli()
        .args(["export", "--input"])
        .arg(&input)
        .args(["--pointer", "/data", "--name", "pools", "--output-dir"])
        .arg(&out_dir)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let path = std::path::PathBuf::from(stdout.trim());
    assert!(path.starts_with(&out_dir), "{stdout}");
    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("pools_") && file_name.ends_with(".csv"));

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "pool,tvl,tags");
    assert_eq!(lines[1], "XLM/USDC,1250.500000,\"[amm,stable]\"");
    assert_eq!(lines[2], "SOL/USDC,,[]");
}

#[test]
fn export_summary_prints_json() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("rows.json");
    std::fs::write(&input, r#"[{"a":1},{"a":2},{"a":3}]"#).unwrap();

    let output = cli()
        .args(["export", "--summary", "--name", "rows", "--input"])
        .arg(&input)
        .arg("--output-dir")
        .arg(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["row_count"], 3);
    assert_eq!(summary["base_name"], "rows");
}

#[test]
fn export_of_empty_array_creates_empty_file() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("empty.json");
    std::fs::write(&input, "[]").unwrap();

    let output = cli()
        .args(["export", "--name", "prices", "--input"])
        .arg(&input)
        .arg("--output-dir")
        .arg(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let path = String::from_utf8(output.stdout).unwrap();
    assert_eq!(std::fs::metadata(path.trim()).unwrap().len(), 0);
}

#[test]
fn export_rejects_non_array_document() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("object.json");
    std::fs::write(&input, r#"{"a":1}"#).unwrap();

    cli()
        .args(["export", "--name", "x", "--input"])
        .arg(&input)
        .arg("--output-dir")
        .arg(temp.path())
        .assert()
        .failure()
        .code(1);
}

#[test]
fn fetch_with_malformed_url_fails_without_retrying() {
    cli()
        .args(["fetch", "not a url"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .code(1);
}

#[test]
fn invalid_flags_are_rejected() {
    cli()
        .args(["--max-attempts", "0", "fetch", "https://api.test"])
        .assert()
        .failure();
    cli()
        .args(["export", "--name", "x"])
        .assert()
        .failure();
}
