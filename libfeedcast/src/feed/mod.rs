//! Feed sources
//!
//! A feed source produces the candidate items for one invocation, in feed
//! order. Fetching or parsing failures abort the invocation.

use async_trait::async_trait;

use crate::error::FeedError;
use crate::types::CandidateItem;

pub mod http;
pub mod parser;

pub use http::HttpFeed;
pub use parser::parse_items;

/// Something that yields the current items of a feed
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CandidateItem>, FeedError>;
}

/// A feed with a fixed list of items
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    items: Vec<CandidateItem>,
}

impl StaticFeed {
    pub fn new(items: Vec<CandidateItem>) -> Self {
        Self { items }
    }

    /// Build from (title, link) pairs
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(title, link)| CandidateItem::new(*title, *link))
                .collect(),
        )
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self) -> Result<Vec<CandidateItem>, FeedError> {
        Ok(self.items.clone())
    }
}
