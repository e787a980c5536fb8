//! Overlapping runs against the same database
//!
//! Each handle below owns its own connection pool, the same as two
//! separate processes sharing one database file.

use anyhow::Result;
use libfeedcast::config::{Mode, StoreConfig};
use libfeedcast::error::StoreError;
use libfeedcast::feed::StaticFeed;
use libfeedcast::platforms::mock::MockPlatform;
use libfeedcast::service::Invocation;
use libfeedcast::store::{database_path, ItemStore, SqliteStore};
use std::time::Duration;
use tempfile::TempDir;

fn create_test_store() -> (TempDir, StoreConfig) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let config = StoreConfig {
        url: temp_dir.path().to_string_lossy().to_string(),
        database: "shared".to_string(),
    };
    (temp_dir, config)
}

#[tokio::test]
async fn test_concurrent_inserts_of_same_url() -> Result<()> {
    let (_temp_dir, store_config) = create_test_store();
    let path = database_path(&store_config.url, &store_config.database);

    let first = SqliteStore::open_path(&path).await?;
    let second = SqliteStore::open_path(&path).await?;
    first.ensure_unique_index().await?;

    let (a, b) = tokio::join!(
        first.insert("X", "http://a", 1),
        second.insert("X", "http://a", 2)
    );

    let results = [a, b];
    let inserted = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::DuplicateKey { .. })))
        .count();

    assert_eq!(inserted, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(first.count().await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_overlapping_invocations_record_each_url_once() -> Result<()> {
    let (_temp_dir, store_config) = create_test_store();

    let store = SqliteStore::open(&store_config).await?;
    store.ensure_unique_index().await?;
    store.close().await;

    let items = [("X", "http://a"), ("Y", "http://b"), ("Z", "http://c")];
    let config = &store_config;
    let run = move |delay_ms| {
        Invocation::new(
            Mode::Production,
            Box::new(MockPlatform::with_delay("mock", Duration::from_millis(delay_ms))),
            Box::new(StaticFeed::from_pairs(&items)),
        )
        .run(config)
    };

    let (first, second) = tokio::join!(run(10), run(15));
    let first = first?;
    let second = second?;

    // Each run accounts for every item, whichever run recorded it
    assert_eq!(first.published + first.skipped, 3);
    assert_eq!(second.published + second.skipped, 3);

    let store = SqliteStore::open(&store_config).await?;
    assert_eq!(store.count().await?, 3);

    Ok(())
}
