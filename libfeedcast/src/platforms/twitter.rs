//! Twitter/X platform implementation
//!
//! Posts through the v2 API with OAuth 1.0a user-context credentials using
//! the twitter-v2 library.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::debug;
use twitter_v2::authorization::Oauth1aToken;
use twitter_v2::TwitterApi;

use super::{error_for_status, Platform};
use crate::config::TwitterCredentials;
use crate::error::{PlatformError, Result};

/// Twitter/X platform client
pub struct TwitterPlatform {
    api: TwitterApi<Oauth1aToken>,
}

impl TwitterPlatform {
    /// Create a client from the four OAuth 1.0a secrets
    ///
    /// No request is made until [`Platform::authenticate`] is called.
    pub fn new(credentials: &TwitterCredentials) -> Self {
        let token = Oauth1aToken::new(
            credentials.consumer_key.expose_secret(),
            credentials.consumer_secret.expose_secret(),
            credentials.access_token.expose_secret(),
            credentials.access_token_secret.expose_secret(),
        );

        Self {
            api: TwitterApi::new(token),
        }
    }
}

#[async_trait]
impl Platform for TwitterPlatform {
    async fn authenticate(&mut self) -> Result<()> {
        let response = self
            .api
            .get_users_me()
            .send()
            .await
            .map_err(|e| match map_twitter_error(e, "verify credentials") {
                PlatformError::Authentication(msg) => PlatformError::Authentication(msg),
                other => PlatformError::Authentication(other.to_string()),
            })?;

        if let Some(user) = response.into_data() {
            debug!(username = %user.username, "Verified Twitter credentials");
        }

        Ok(())
    }

    async fn post(&self, message: &str) -> Result<String> {
        let tweet = self
            .api
            .post_tweet()
            .text(message.to_string())
            .send()
            .await
            .map_err(|e| map_twitter_error(e, "create tweet"))?
            .into_data()
            .ok_or_else(|| {
                PlatformError::Posting(
                    "Twitter posting failed (create tweet): response contained no tweet"
                        .to_string(),
                )
            })?;

        Ok(tweet.id.to_string())
    }

    fn name(&self) -> &str {
        "twitter"
    }
}

/// Map twitter-v2 errors to `PlatformError`
///
/// API errors are classified by HTTP status; transport failures become
/// `PlatformError::Network`.
fn map_twitter_error(error: twitter_v2::Error, context: &str) -> PlatformError {
    match error {
        twitter_v2::Error::Api(api_error) => error_for_status(
            "Twitter",
            context,
            api_error.status.as_u16(),
            &api_error.to_string(),
        ),
        twitter_v2::Error::Request(request_error) => PlatformError::Network(format!(
            "Twitter request failed ({}): {}",
            context, request_error
        )),
        other => PlatformError::Posting(format!("Twitter error ({}): {}", context, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> TwitterCredentials {
        TwitterCredentials {
            consumer_key: "consumer-key".to_string().into(),
            consumer_secret: "consumer-secret".to_string().into(),
            access_token: "access-token".to_string().into(),
            access_token_secret: "access-token-secret".to_string().into(),
        }
    }

    #[test]
    fn test_twitter_platform_name() {
        let platform = TwitterPlatform::new(&credentials());
        assert_eq!(platform.name(), "twitter");
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let debug = format!("{:?}", credentials());
        assert!(!debug.contains("consumer-secret"));
        assert!(!debug.contains("access-token-secret"));
    }
}
