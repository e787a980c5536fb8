use anyhow::Result;
use assert_cmd::Command;
use libfeedcast::config::StoreConfig;
use libfeedcast::store::{ItemStore, SqliteStore};
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a store with three published items
async fn create_test_store() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    let store = SqliteStore::open(&store_config(&temp_dir)).await?;

    store.insert("Oldest", "http://example.com/1", 1_700_000_000).await?;
    store.insert("Middle", "http://example.com/2", 1_700_000_100).await?;
    store.insert("Newest", "http://example.com/3", 1_700_000_200).await?;
    store.close().await;

    Ok(temp_dir)
}

fn store_config(temp_dir: &TempDir) -> StoreConfig {
    StoreConfig {
        url: temp_dir.path().to_string_lossy().to_string(),
        database: "history_test".to_string(),
    }
}

fn feedcast_history(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("feedcast-history").unwrap();
    cmd.env_clear()
        .env("FEEDCAST_CONFIG", temp_dir.path().join("absent.toml"))
        .env("FEEDCAST_STORE_URL", temp_dir.path())
        .env("FEEDCAST_STORE_DB", "history_test");
    cmd
}

#[tokio::test]
async fn test_text_output_newest_first() -> Result<()> {
    let temp_dir = create_test_store().await?;

    let output = feedcast_history(&temp_dir).output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("| Newest | http://example.com/3"));
    assert!(lines[2].ends_with("| Oldest | http://example.com/1"));

    Ok(())
}

#[tokio::test]
async fn test_limit() -> Result<()> {
    let temp_dir = create_test_store().await?;

    let output = feedcast_history(&temp_dir).args(["--limit", "1"]).output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("Newest"));

    Ok(())
}

#[tokio::test]
async fn test_json_output() -> Result<()> {
    let temp_dir = create_test_store().await?;

    let output = feedcast_history(&temp_dir).args(["--format", "json"]).output()?;
    assert!(output.status.success());

    let records: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout)?;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["url"], "http://example.com/3");
    assert_eq!(records[0]["title"], "Newest");
    assert_eq!(records[0]["timestamp"], 1_700_000_200);

    Ok(())
}

#[tokio::test]
async fn test_jsonl_output() -> Result<()> {
    let temp_dir = create_test_store().await?;

    let output = feedcast_history(&temp_dir).args(["--format", "jsonl"]).output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let urls: Vec<String> = stdout
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["url"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        urls,
        vec![
            "http://example.com/3",
            "http://example.com/2",
            "http://example.com/1"
        ]
    );

    Ok(())
}

#[test]
fn test_missing_database() {
    let temp_dir = TempDir::new().unwrap();

    feedcast_history(&temp_dir)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Database not found"));
}

#[test]
fn test_invalid_format() {
    let temp_dir = TempDir::new().unwrap();

    feedcast_history(&temp_dir)
        .args(["--format", "csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
