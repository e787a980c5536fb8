//! Core types for Feedcast

use serde::{Deserialize, Serialize};

/// Identifier the store assigns to a record on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable evidence that an item was posted (or simulated in a dry run)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedRecord {
    pub id: RecordId,
    pub title: String,
    /// Deduplication key, unique across all records
    pub url: String,
    /// Unix seconds at which the record was created
    pub timestamp: i64,
}

/// One entry from the polled feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub title: String,
    pub link: String,
}

impl CandidateItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }

    /// The outgoing message: title, newline, link
    pub fn message(&self) -> String {
        format_message(&self.title, &self.link)
    }
}

pub fn format_message(title: &str, url: &str) -> String {
    format!("{}\n{}", title, url)
}
