//! Feedcast - publish new syndication feed items to social platforms
//!
//! This library polls an RSS or Atom feed, posts every item it has not seen
//! before to a social platform, and records each published URL so the next
//! invocation skips it.

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod pipeline;
pub mod platforms;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{Config, Mode};
pub use error::{FeedcastError, Result};
pub use pipeline::{PassSummary, Pipeline};
pub use store::{ItemStore, SqliteStore};
pub use types::{CandidateItem, PublishedRecord, RecordId};
