//! Exit-code and output-file behavior of the `rcpt` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn rcpt(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rcpt").unwrap();
    cmd.current_dir(workdir)
        .env_remove("AZURE_ENDPOINT")
        .env_remove("AZURE_KEY")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", workdir.join("xdg"));
    cmd
}

fn with_dummy_credentials(cmd: &mut Command) -> &mut Command {
    cmd.env("AZURE_ENDPOINT", "http://127.0.0.1:9")
        .env("AZURE_KEY", "dummy-key-for-tests")
}

#[test]
fn test_missing_key_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.jpg"), b"\xFF\xD8\xFF\xE0\0\x10JFIF\0").unwrap();

    rcpt(dir.path())
        .env("AZURE_ENDPOINT", "https://example.cognitiveservices.azure.com")
        .args(["--input", "a.jpg", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AZURE_KEY"));

    assert!(!dir.path().join("extraction_log.json").exists());
    assert!(!dir.path().join("extraction_log.csv").exists());
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();

    with_dummy_credentials(&mut rcpt(dir.path()))
        .args(["-i", "does-not-exist", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input not found"));
}

#[test]
fn test_unsupported_single_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "hello").unwrap();

    with_dummy_credentials(&mut rcpt(dir.path()))
        .args(["-i", "notes.txt", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported format"));

    assert!(!dir.path().join("extraction_log.json").exists());
}

#[test]
fn test_empty_directory_writes_empty_logs() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("receipts")).unwrap();
    fs::write(dir.path().join("receipts").join("readme.txt"), "skip me").unwrap();

    with_dummy_credentials(&mut rcpt(dir.path()))
        .args(["-i", "receipts", "--no-progress"])
        .assert()
        .success();

    let json = fs::read_to_string(dir.path().join("extraction_log.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, serde_json::json!([]));

    let csv = fs::read_to_string(dir.path().join("extraction_log.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1);
    assert!(csv.starts_with("file,vendor,date"));
}

#[test]
fn test_custom_output_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("receipts")).unwrap();

    with_dummy_credentials(&mut rcpt(dir.path()))
        .args([
            "-i",
            "receipts",
            "--json",
            "out/log.json",
            "--csv",
            "out/log.csv",
            "--items-csv",
            "out/items.csv",
            "--no-progress",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("out/log.json"));

    assert!(dir.path().join("out/log.json").exists());
    assert!(dir.path().join("out/log.csv").exists());
    assert!(dir.path().join("out/items.csv").exists());
    assert!(!dir.path().join("extraction_log.json").exists());
}

#[test]
fn test_per_file_failures_still_exit_zero() {
    let dir = tempfile::tempdir().unwrap();
    let receipts = dir.path().join("receipts");
    fs::create_dir(&receipts).unwrap();
    fs::write(receipts.join("a.jpg"), b"\xFF\xD8\xFF\xE0\0\x10JFIF\0").unwrap();
    fs::write(receipts.join("b.png"), b"not a png").unwrap();
    fs::write(
        dir.path().join("config.json"),
        r#"{"service": {"max_retries": 0, "request_timeout_secs": 5}}"#,
    )
    .unwrap();

    // Nothing listens on the discard port, so the upload fails per file.
    with_dummy_credentials(&mut rcpt(dir.path()))
        .args(["-c", "config.json", "-i", "receipts", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed files:"));

    let json = fs::read_to_string(dir.path().join("extraction_log.json")).unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0]["file_path"].as_str().unwrap().ends_with("a.jpg"));
    assert!(records[0]["error"].as_str().unwrap().starts_with("network error"));
    assert!(records[1]["error"].as_str().unwrap().contains("corrupt"));
    assert_eq!(records[1]["validation_status"], "INSUFFICIENT_DATA");

    let csv = fs::read_to_string(dir.path().join("extraction_log.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn test_bad_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("receipts")).unwrap();
    fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    with_dummy_credentials(&mut rcpt(dir.path()))
        .args(["-c", "config.json", "-i", "receipts", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

#[test]
fn test_invalid_endpoint_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("receipts")).unwrap();

    rcpt(dir.path())
        .env("AZURE_ENDPOINT", "not-a-url")
        .env("AZURE_KEY", "dummy-key-for-tests")
        .args(["-i", "receipts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http(s) URL"));
}
