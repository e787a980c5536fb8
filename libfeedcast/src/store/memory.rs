//! In-memory store
//!
//! Used by tests and dry runs that should leave no trace on disk. Uniqueness
//! of `url` is always enforced.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ItemStore, StoreResult};
use crate::error::StoreError;
use crate::types::{PublishedRecord, RecordId};

#[derive(Debug, Default)]
struct Inner {
    records: Vec<PublishedRecord>,
    next_id: i64,
    insert_calls: usize,
}

/// Store that keeps records in process memory
///
/// Clones share the same records, so a test can hand one clone to the
/// pipeline and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    fail_inserts: Option<String>,
    /// Recorded, but reported as absent by `exists`
    unseen: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds records for `items` (title, url)
    pub fn with_records(items: &[(&str, &str)]) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for (title, url) in items {
                inner.next_id += 1;
                let id = RecordId(inner.next_id);
                inner.records.push(PublishedRecord {
                    id,
                    title: title.to_string(),
                    url: url.to_string(),
                    timestamp: 0,
                });
            }
        }
        store
    }

    /// A store where another run recorded `items` after this run checked
    ///
    /// `exists` reports these urls as absent, while `insert` still rejects
    /// them with `DuplicateKey`.
    pub fn with_racing_records(items: &[(&str, &str)]) -> Self {
        let mut store = Self::with_records(items);
        store.unseen = items.iter().map(|(_, url)| url.to_string()).collect();
        store
    }

    /// A store whose inserts fail with a non-duplicate error
    pub fn failing_inserts(message: &str) -> Self {
        Self {
            fail_inserts: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Snapshot of all records in insertion order
    pub fn records(&self) -> Vec<PublishedRecord> {
        self.lock().records.clone()
    }

    /// Urls of all records in insertion order
    pub fn urls(&self) -> Vec<String> {
        self.lock().records.iter().map(|r| r.url.clone()).collect()
    }

    /// Number of times insert was called, including rejected calls
    pub fn insert_calls(&self) -> usize {
        self.lock().insert_calls
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn exists(&self, url: &str) -> StoreResult<bool> {
        if self.unseen.iter().any(|unseen| unseen == url) {
            return Ok(false);
        }
        Ok(self.lock().records.iter().any(|r| r.url == url))
    }

    async fn insert(&self, title: &str, url: &str, timestamp: i64) -> StoreResult<RecordId> {
        let mut inner = self.lock();
        inner.insert_calls += 1;

        if let Some(message) = &self.fail_inserts {
            return Err(StoreError::IoError(std::io::Error::other(message.clone())));
        }

        if inner.records.iter().any(|r| r.url == url) {
            return Err(StoreError::DuplicateKey {
                url: url.to_string(),
            });
        }

        inner.next_id += 1;
        let id = RecordId(inner.next_id);
        inner.records.push(PublishedRecord {
            id,
            title: title.to_string(),
            url: url.to_string(),
            timestamp,
        });
        Ok(id)
    }

    async fn ensure_unique_index(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<PublishedRecord>> {
        let mut records = self.lock().records.clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.0.cmp(&a.id.0)));
        records.truncate(limit);
        Ok(records)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.lock().records.len() as u64)
    }
}
