//! SQLite-backed store

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::{ItemStore, StoreResult};
use crate::config::{validate_database_name, StoreConfig};
use crate::error::{Result, StoreError};
use crate::types::{PublishedRecord, RecordId};

/// Connection string that selects a private in-memory database
pub const MEMORY_URL: &str = ":memory:";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the store described by `config`
    ///
    /// The database file is `<url>/<database>.db`; parent directories are
    /// created as needed and migrations are applied.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        validate_database_name(&config.database)?;

        if config.url == MEMORY_URL {
            return Ok(Self::in_memory().await?);
        }

        let path = database_path(&config.url, &config.database);
        Ok(Self::open_path(&path).await?)
    }

    /// Open (creating if necessary) a database file at `path`
    pub async fn open_path(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Concurrent writers wait for the lock instead of failing with SQLITE_BUSY
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Open a private in-memory database
    ///
    /// Limited to a single connection, since every SQLite in-memory
    /// connection is its own database.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Path of the database file for a store directory and database name
pub fn database_path(url: &str, database: &str) -> PathBuf {
    let expanded = shellexpand::tilde(url).to_string();
    Path::new(&expanded).join(format!("{}.db", database))
}

#[async_trait]
impl ItemStore for SqliteStore {
    async fn exists(&self, url: &str) -> StoreResult<bool> {
        let mut conn = self.pool.acquire().await?;

        let found: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM published_items WHERE url = ?)")
                .bind(url)
                .fetch_one(&mut *conn)
                .await?;

        Ok(found != 0)
    }

    async fn insert(&self, title: &str, url: &str, timestamp: i64) -> StoreResult<RecordId> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO published_items (title, url, timestamp)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(url)
        .bind(timestamp)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::from_insert(e, url))?;

        Ok(RecordId(result.last_insert_rowid()))
    }

    async fn ensure_unique_index(&self) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_published_items_url ON published_items(url)",
        )
        .execute(&mut *conn)
        .await?;

        debug!("Unique index on published_items.url is in place");
        Ok(())
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<PublishedRecord>> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query(
            r#"
            SELECT id, title, url, timestamp
            FROM published_items
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .iter()
            .map(|r| PublishedRecord {
                id: RecordId(r.get("id")),
                title: r.get("title"),
                url: r.get("url"),
                timestamp: r.get("timestamp"),
            })
            .collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        let mut conn = self.pool.acquire().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM published_items")
            .fetch_one(&mut *conn)
            .await?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedcastError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_insert_then_exists() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.ensure_unique_index().await.unwrap();

        assert!(!store.exists("http://a").await.unwrap());

        let id = store.insert("X", "http://a", 100).await.unwrap();
        assert!(id.0 > 0);
        assert!(store.exists("http://a").await.unwrap());
        assert!(!store.exists("http://a/").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.ensure_unique_index().await.unwrap();

        store.insert("X", "http://a", 100).await.unwrap();
        let err = store.insert("X again", "http://a", 200).await.unwrap_err();

        match err {
            StoreError::DuplicateKey { url } => assert_eq!(url, "http://a"),
            other => panic!("Expected DuplicateKey, got {:?}", other),
        }
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ensure_unique_index_is_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();

        store.ensure_unique_index().await.unwrap();
        store.ensure_unique_index().await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_unique_index_fails_over_existing_duplicates() {
        let store = SqliteStore::in_memory().await.unwrap();

        // Without the index nothing stops a duplicate row
        store.insert("X", "http://a", 100).await.unwrap();
        store.insert("X", "http://a", 101).await.unwrap();

        assert!(store.ensure_unique_index().await.is_err());
        // Store remains usable
        assert!(store.exists("http://a").await.unwrap());
    }

    #[tokio::test]
    async fn test_recent_orders_newest_first() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert("old", "http://old", 100).await.unwrap();
        store.insert("new", "http://new", 300).await.unwrap();
        store.insert("mid", "http://mid", 200).await.unwrap();

        let records = store.recent(2).await.unwrap();
        let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["http://new", "http://mid"]);
        assert_eq!(records[0].title, "new");
        assert_eq!(records[0].timestamp, 300);
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig {
            url: temp_dir.path().join("nested").to_string_lossy().to_string(),
            database: "tweets".to_string(),
        };

        let store = SqliteStore::open(&config).await.unwrap();
        store.insert("X", "http://a", 1).await.unwrap();
        store.close().await;

        assert!(temp_dir.path().join("nested").join("tweets.db").exists());

        // Data survives reopening
        let reopened = SqliteStore::open(&config).await.unwrap();
        assert!(reopened.exists("http://a").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_rejects_bad_database_name() {
        let config = StoreConfig {
            url: MEMORY_URL.to_string(),
            database: "../etc/passwd".to_string(),
        };

        match SqliteStore::open(&config).await {
            Err(FeedcastError::Config(_)) => {}
            Err(other) => panic!("Expected config error, got {:?}", other),
            Ok(_) => panic!("Expected config error"),
        }
    }

    #[test]
    fn test_database_path() {
        let path = database_path("/var/lib/feedcast", "blog");
        assert_eq!(path, PathBuf::from("/var/lib/feedcast/blog.db"));
    }
}
