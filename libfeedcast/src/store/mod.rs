//! Published-item store
//!
//! The store is the only state that survives between invocations. It answers
//! "has this URL been published?" and records each URL once published.
//! Uniqueness of `url` is enforced by the store itself, so two overlapping
//! invocations can never leave two records for the same item.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{PublishedRecord, RecordId};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{database_path, SqliteStore, MEMORY_URL};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Something that can check for and record published items
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Whether a record with exactly this url exists
    async fn exists(&self, url: &str) -> StoreResult<bool>;

    /// Record a published item
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateKey` if `url` is already recorded. Callers
    /// treat that as the desired end state rather than a failure.
    async fn insert(&self, title: &str, url: &str, timestamp: i64) -> StoreResult<RecordId>;

    /// Create the unique index on url if it does not exist yet
    ///
    /// Idempotent; safe to call on every startup.
    async fn ensure_unique_index(&self) -> StoreResult<()>;

    /// Most recent records first
    async fn recent(&self, limit: usize) -> StoreResult<Vec<PublishedRecord>>;

    /// Total number of records
    async fn count(&self) -> StoreResult<u64>;
}
