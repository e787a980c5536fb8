//! Mastodon publisher
//!
//! Any server speaking the Mastodon client API works (Pleroma, GoToSocial,
//! Akkoma). Statuses use the account's default visibility.

use async_trait::async_trait;
use megalodon::{Megalodon, SNS};
use secrecy::ExposeSecret;
use tracing::debug;

use super::{error_for_status, extract_http_status, Platform};
use crate::config::MastodonCredentials;
use crate::error::{PlatformError, Result};

pub struct MastodonPlatform {
    client: Box<dyn Megalodon + Send + Sync>,
    instance_url: String,
}

impl MastodonPlatform {
    /// Create a client for `instance_url` with an OAuth access token
    pub fn new(instance_url: String, access_token: String) -> Result<Self> {
        let client = megalodon::generator(
            SNS::Mastodon,
            instance_url.clone(),
            Some(access_token),
            None,
        )
        .map_err(|e| {
            PlatformError::Authentication(format!("Invalid Mastodon client settings: {}", e))
        })?;

        Ok(Self {
            client,
            instance_url,
        })
    }

    /// Create a client from configured credentials
    ///
    /// Instance names without a scheme get `https://`.
    pub fn from_credentials(credentials: &MastodonCredentials) -> Result<Self> {
        let token = credentials.access_token.expose_secret().trim().to_string();
        if token.is_empty() {
            return Err(
                PlatformError::Authentication("Mastodon access token is empty".to_string()).into(),
            );
        }

        Self::new(normalize_instance_url(&credentials.instance), token)
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }
}

fn normalize_instance_url(instance: &str) -> String {
    let instance = instance.trim().trim_end_matches('/');
    if instance.starts_with("http://") || instance.starts_with("https://") {
        instance.to_string()
    } else {
        format!("https://{}", instance)
    }
}

#[async_trait]
impl Platform for MastodonPlatform {
    async fn authenticate(&mut self) -> Result<()> {
        let account = self
            .client
            .verify_account_credentials()
            .await
            .map_err(|e| {
                PlatformError::Authentication(map_megalodon_error(e, "verify credentials").to_string())
            })?;

        debug!(
            account = %account.json.acct,
            instance = %self.instance_url,
            "Verified Mastodon credentials"
        );
        Ok(())
    }

    async fn post(&self, message: &str) -> Result<String> {
        let response = self
            .client
            .post_status(message.to_string(), None)
            .await
            .map_err(|e| map_megalodon_error(e, "post status"))?;

        let post_id = match response.json {
            megalodon::megalodon::PostStatusOutput::Status(status) => status.id,
            megalodon::megalodon::PostStatusOutput::ScheduledStatus(scheduled) => scheduled.id,
        };

        Ok(post_id)
    }

    fn name(&self) -> &str {
        "mastodon"
    }
}

/// Map megalodon errors to `PlatformError`
///
/// megalodon reports HTTP failures as text, so the status is recovered from
/// the message when present.
fn map_megalodon_error(error: megalodon::error::Error, context: &str) -> PlatformError {
    let error_str = error.to_string();

    if let Some(status) = extract_http_status(&error_str) {
        return error_for_status("Mastodon", context, status, &error_str);
    }

    let error_lower = error_str.to_lowercase();
    if error_lower.contains("unauthorized") || error_lower.contains("forbidden") {
        PlatformError::Authentication(format!(
            "Mastodon authentication failed ({}): {}",
            context, error_str
        ))
    } else if error_lower.contains("rate limit") || error_lower.contains("too many requests") {
        PlatformError::RateLimit(format!(
            "Mastodon rate limit exceeded ({}): {}",
            context, error_str
        ))
    } else {
        PlatformError::Network(format!(
            "Could not reach Mastodon instance ({}): {}",
            context, error_str
        ))
    }
}
