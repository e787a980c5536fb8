use feed_rs::model::Link;
use feed_rs::parser;
use tracing::warn;

use crate::error::FeedError;
use crate::types::CandidateItem;

/// Parse RSS or Atom bytes into candidate items, keeping feed order
///
/// Entries without a link have no dedup key and are dropped.
/// See [`canonical_link`] for which link an entry is keyed by.
pub fn parse_items(bytes: &[u8]) -> Result<Vec<CandidateItem>, FeedError> {
    let feed = parser::parse(bytes).map_err(|e| FeedError::Parse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();

            match canonical_link(&entry.links) {
                Some(link) => Some(CandidateItem::new(title, link)),
                None => {
                    warn!(title = %title, id = %entry.id, "Skipping feed entry without a link");
                    None
                }
            }
        })
        .collect();

    Ok(items)
}

/// The link that identifies an entry
///
/// Atom entries often list `replies`, `edit` or `self` links ahead of the
/// page itself, so the first link with no `rel` or `rel="alternate"` wins.
/// Otherwise the first non-empty link is used.
fn canonical_link(links: &[Link]) -> Option<&str> {
    let usable = || {
        links
            .iter()
            .map(|link| (link.rel.as_deref(), link.href.trim()))
            .filter(|(_, href)| !href.is_empty())
    };

    usable()
        .find(|(rel, _)| rel.map_or(true, |rel| rel.eq_ignore_ascii_case("alternate")))
        .or_else(|| usable().next())
        .map(|(_, href)| href)
}
