use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{parse_items, FeedSource};
use crate::error::FeedError;
use crate::types::CandidateItem;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Feed fetched over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpFeed {
    /// Create a feed source with a default client
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("feedcast/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, url))
    }

    /// Create a feed source with a caller-configured client
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<Vec<CandidateItem>, FeedError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length as usize > MAX_FEED_SIZE {
                return Err(FeedError::ResponseTooLarge(MAX_FEED_SIZE));
            }
        }

        let bytes = response.bytes().await?;
        if bytes.len() > MAX_FEED_SIZE {
            return Err(FeedError::ResponseTooLarge(MAX_FEED_SIZE));
        }

        let items = parse_items(&bytes)?;
        debug!(url = %self.url, count = items.len(), "Fetched feed");
        Ok(items)
    }
}
