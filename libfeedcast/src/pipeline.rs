//! The publish pipeline
//!
//! One pass walks the feed items in order. For each item the store is asked
//! whether its URL was already published; new items are posted and then
//! recorded. Items are handled strictly one at a time so posts go out in
//! feed order and the platform's rate limits are respected.
//!
//! Failure policy:
//! - a failed post stops the pass; everything recorded so far stays recorded
//! - a duplicate-key conflict on insert means another run recorded the item
//!   first, which is logged and otherwise ignored
//! - any other insert failure is logged and the pass continues, because the
//!   post has already gone out

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Mode;
use crate::error::{Result, StoreError};
use crate::platforms::Platform;
use crate::store::ItemStore;
use crate::types::{format_message, CandidateItem, RecordId};

/// Totals for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// Items posted (or simulated in a dry run)
    pub published: usize,
    /// Items skipped because they were already recorded
    pub skipped: usize,
    /// Posted items whose insert hit an existing record
    pub duplicates: usize,
    /// Posted items whose insert failed for another reason
    pub unrecorded: usize,
}

/// What happened to a single item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    AlreadyPublished,
    Published { record: RecordId },
    RecordConflict,
    RecordFailed,
}

pub struct Pipeline<'a> {
    store: &'a dyn ItemStore,
    platform: &'a dyn Platform,
    mode: Mode,
}

impl<'a> Pipeline<'a> {
    /// The platform must already be authenticated
    pub fn new(store: &'a dyn ItemStore, platform: &'a dyn Platform, mode: Mode) -> Self {
        Self {
            store,
            platform,
            mode,
        }
    }

    /// Process `items` in order
    ///
    /// # Errors
    ///
    /// Returns the platform error of the first failed post, or a store error
    /// if the store cannot be queried. Items after the failure are not
    /// attempted.
    pub async fn run_pass(&self, items: &[CandidateItem]) -> Result<PassSummary> {
        let mut summary = PassSummary::default();

        for item in items {
            let outcome = match self.process_item(item).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        url = %item.link,
                        published = summary.published,
                        error = %e,
                        "Stopping pass"
                    );
                    return Err(e);
                }
            };

            match outcome {
                ItemOutcome::AlreadyPublished => summary.skipped += 1,
                ItemOutcome::Published { .. } => summary.published += 1,
                ItemOutcome::RecordConflict => {
                    summary.published += 1;
                    summary.duplicates += 1;
                }
                ItemOutcome::RecordFailed => {
                    summary.published += 1;
                    summary.unrecorded += 1;
                }
            }
        }

        info!(
            count = summary.published,
            skipped = summary.skipped,
            platform = self.platform.name(),
            dry_run = self.mode.is_dry_run(),
            "{} items were published",
            summary.published
        );

        Ok(summary)
    }

    /// Check, post and record a single item
    pub async fn process_item(&self, item: &CandidateItem) -> Result<ItemOutcome> {
        if self.store.exists(&item.link).await? {
            debug!(url = %item.link, "Item already exists");
            return Ok(ItemOutcome::AlreadyPublished);
        }

        let message = format_message(&item.title, &item.link);

        if self.mode.is_dry_run() {
            debug!(url = %item.link, "Dry run, not posting");
        } else {
            let post_id = self.platform.post(&message).await?;
            debug!(url = %item.link, post_id = %post_id, "Posted to {}", self.platform.name());
        }

        debug!(
            title = %item.title,
            url = %item.link,
            message = %message,
            "Published item"
        );

        let timestamp = chrono::Utc::now().timestamp();
        match self.store.insert(&item.title, &item.link, timestamp).await {
            Ok(record) => Ok(ItemOutcome::Published { record }),
            Err(StoreError::DuplicateKey { url }) => {
                warn!(url = %url, "Item was recorded by another run");
                Ok(ItemOutcome::RecordConflict)
            }
            Err(e) => {
                error!(url = %item.link, error = %e, "Failed to record published item");
                Ok(ItemOutcome::RecordFailed)
            }
        }
    }
}
