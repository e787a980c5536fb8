//! One invocation, end to end
//!
//! Order matters here: credentials are verified before the store is opened,
//! the unique index is set up in the background while items are processed,
//! and the feed is fetched only once both the platform and store are ready.
//!
//! # Example
//!
//! ```no_run
//! use libfeedcast::service::run_invocation;
//! use libfeedcast::Config;
//!
//! # async fn example() -> libfeedcast::Result<()> {
//! let config = Config::load()?;
//! let summary = run_invocation(&config).await?;
//! println!("{} items were published", summary.published);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Mode, StoreConfig};
use crate::error::Result;
use crate::feed::{FeedSource, HttpFeed};
use crate::pipeline::{PassSummary, Pipeline};
use crate::platforms::{create_platform, Platform};
use crate::store::{ItemStore, SqliteStore};

/// How long to wait for a still-running index setup once the pass is done
const INDEX_SETUP_GRACE: Duration = Duration::from_secs(5);

/// Everything one pass needs apart from the store
pub struct Invocation {
    mode: Mode,
    platform: Box<dyn Platform>,
    feed: Box<dyn FeedSource>,
}

impl Invocation {
    pub fn new(mode: Mode, platform: Box<dyn Platform>, feed: Box<dyn FeedSource>) -> Self {
        Self {
            mode,
            platform,
            feed,
        }
    }

    /// Build the platform and HTTP feed described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let platform = create_platform(config)?;
        let feed = HttpFeed::new(config.feed.url.clone())?;

        Ok(Self::new(config.mode, platform, Box::new(feed)))
    }

    /// Run one pass against the store described by `store_config`
    ///
    /// # Errors
    ///
    /// Fails before the store is opened if authentication fails; fails
    /// before any item is processed if the store cannot be opened or the
    /// feed cannot be fetched; otherwise fails on the first failed post.
    pub async fn run(mut self, store_config: &StoreConfig) -> Result<PassSummary> {
        info!(
            platform = self.platform.name(),
            mode = %self.mode,
            "Starting feed pass"
        );

        self.platform.authenticate().await?;

        let store = SqliteStore::open(store_config).await?;
        let index_setup = spawn_index_setup(store.clone());

        let result = self.publish(&store).await;

        finish_index_setup(index_setup).await;
        store.close().await;

        result
    }

    async fn publish(&self, store: &dyn ItemStore) -> Result<PassSummary> {
        let items = self.feed.fetch().await?;
        debug!(count = items.len(), "Candidate items");

        Pipeline::new(store, self.platform.as_ref(), self.mode)
            .run_pass(&items)
            .await
    }
}

/// Validate `config`, then run one pass with its platform and feed
pub async fn run_invocation(config: &Config) -> Result<PassSummary> {
    Invocation::from_config(config)?.run(&config.store).await
}

/// Start unique-index creation without blocking the pass
///
/// Failure only widens the window for duplicate records under overlapping
/// runs, so it is logged and never propagated.
fn spawn_index_setup<S>(store: S) -> JoinHandle<()>
where
    S: ItemStore + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = store.ensure_unique_index().await {
            error!(error = %e, "Failed to ensure unique index on published items");
        }
    })
}

async fn finish_index_setup(handle: JoinHandle<()>) {
    match tokio::time::timeout(INDEX_SETUP_GRACE, handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Index setup task did not complete"),
        Err(_) => warn!("Index setup still running, leaving it behind"),
    }
}
