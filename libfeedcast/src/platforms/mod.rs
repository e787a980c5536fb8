//! Publisher abstraction and implementations
//!
//! A platform verifies its credentials once per invocation and then posts
//! free-text messages. The pipeline only sees the [`Platform`] trait, so
//! tests run against [`mock::MockPlatform`] without any network access.
//!
//! # Examples
//!
//! ```no_run
//! use libfeedcast::platforms::{Platform, mock::MockPlatform};
//!
//! # async fn example() -> libfeedcast::Result<()> {
//! let mut platform = MockPlatform::success("mock");
//! platform.authenticate().await?;
//! let post_id = platform.post("Hello\nhttps://example.com/hello").await?;
//! println!("Posted: {}", post_id);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::config::{Config, PlatformKind};
use crate::error::{ConfigError, PlatformError, Result};

pub mod mastodon;
pub mod mock;
pub mod twitter;

use self::mastodon::MastodonPlatform;
use self::twitter::TwitterPlatform;

/// Something that can post a message to a social platform
#[async_trait]
pub trait Platform: Send + Sync {
    /// Verify credentials with the platform
    ///
    /// Called once before any item is processed.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Authentication` if the credentials are rejected
    /// or the platform cannot be reached.
    async fn authenticate(&mut self) -> Result<()>;

    /// Post a message and return the platform's id for it
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Posting`, `PlatformError::Network` or
    /// `PlatformError::RateLimit` when the post does not go through.
    async fn post(&self, message: &str) -> Result<String>;

    /// Lowercase platform identifier (e.g. "twitter", "mastodon")
    fn name(&self) -> &str;
}

/// Build the platform selected by `config`
///
/// The returned platform is not yet authenticated.
pub fn create_platform(config: &Config) -> Result<Box<dyn Platform>> {
    match config.platform {
        PlatformKind::Twitter => {
            let credentials = config.credentials.twitter.as_ref().ok_or_else(|| {
                ConfigError::MissingField("twitter credentials".to_string())
            })?;
            Ok(Box::new(TwitterPlatform::new(credentials)))
        }
        PlatformKind::Mastodon => {
            let credentials = config.credentials.mastodon.as_ref().ok_or_else(|| {
                ConfigError::MissingField("mastodon credentials".to_string())
            })?;
            Ok(Box::new(MastodonPlatform::from_credentials(credentials)?))
        }
    }
}

/// Map an HTTP status from a platform API to a `PlatformError`
///
/// * `platform` - Display name used in the message ("Twitter", "Mastodon")
/// * `context` - The operation that failed ("verify credentials", "post")
pub(crate) fn error_for_status(
    platform: &str,
    context: &str,
    status: u16,
    detail: &str,
) -> PlatformError {
    match status {
        401 | 403 => PlatformError::Authentication(format!(
            "{} authentication failed ({}): {}. \
             Suggestion: Verify the configured credentials are valid and have write access.",
            platform, context, detail
        )),
        429 => PlatformError::RateLimit(format!(
            "{} rate limit exceeded ({}): {}",
            platform, context, detail
        )),
        500..=599 => PlatformError::Network(format!(
            "{} server error ({}): {}",
            platform, context, detail
        )),
        _ => PlatformError::Posting(format!(
            "{} request failed ({}): HTTP {}: {}",
            platform, context, status, detail
        )),
    }
}

/// Extract an HTTP status code from an error message
///
/// Looks for patterns like "HTTP 401", "status 403" or a standalone
/// "429: ..." in the text.
pub(crate) fn extract_http_status(error_str: &str) -> Option<u16> {
    let prefixes = ["HTTP ", "status ", "code: ", "status_code: "];

    for prefix in &prefixes {
        if let Some(pos) = error_str.find(prefix) {
            let after_prefix = &error_str[pos + prefix.len()..];
            if let Some(code) = after_prefix.get(0..3).and_then(|s| s.parse::<u16>().ok()) {
                if (100..=599).contains(&code) {
                    return Some(code);
                }
            }
        }
    }

    let bytes = error_str.as_bytes();
    for (i, window) in bytes.windows(4).enumerate() {
        let is_code = window[..3].iter().all(u8::is_ascii_digit)
            && (window[3] == b':' || window[3] == b' ')
            && (i == 0 || !bytes[i - 1].is_ascii_digit());
        if !is_code {
            continue;
        }
        if let Some(code) = std::str::from_utf8(&window[..3])
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
        {
            if (100..=599).contains(&code) {
                return Some(code);
            }
        }
    }

    None
}
