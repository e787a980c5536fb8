//! Configuration management for Feedcast
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables. Platform credentials are only ever read from the
//! environment and are never serialized.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, Result};

pub const ENV_CONFIG: &str = "FEEDCAST_CONFIG";
pub const ENV_FEED_URL: &str = "FEEDCAST_FEED_URL";
pub const ENV_STORE_URL: &str = "FEEDCAST_STORE_URL";
pub const ENV_STORE_DB: &str = "FEEDCAST_STORE_DB";
pub const ENV_ENVIRONMENT: &str = "FEEDCAST_ENVIRONMENT";
pub const ENV_PLATFORM: &str = "FEEDCAST_PLATFORM";

pub const ENV_TWITTER_CONSUMER_KEY: &str = "TWITTER_CONSUMER_KEY";
pub const ENV_TWITTER_CONSUMER_SECRET: &str = "TWITTER_CONSUMER_SECRET";
pub const ENV_TWITTER_ACCESS_TOKEN: &str = "TWITTER_ACCESS_TOKEN";
pub const ENV_TWITTER_ACCESS_TOKEN_SECRET: &str = "TWITTER_ACCESS_TOKEN_SECRET";

pub const ENV_MASTODON_INSTANCE: &str = "MASTODON_INSTANCE";
pub const ENV_MASTODON_ACCESS_TOKEN: &str = "MASTODON_ACCESS_TOKEN";

/// Run mode
///
/// Development mode is the dry run: nothing is posted externally, but
/// records are still written and logging is verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Production,
    Development,
}

impl Mode {
    /// Interpret an environment value. Only "development" (or "dev")
    /// selects development mode; every other value means production.
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Mode::Development,
            _ => Mode::Production,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Mode::Development)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Production => write!(f, "production"),
            Mode::Development => write!(f, "development"),
        }
    }
}

/// Which publisher to post through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    #[default]
    Twitter,
    Mastodon,
}

impl FromStr for PlatformKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "twitter" | "x" => Ok(PlatformKind::Twitter),
            "mastodon" => Ok(PlatformKind::Mastodon),
            other => Err(ConfigError::InvalidValue {
                field: "platform".to_string(),
                reason: format!("unknown platform '{}' (expected twitter or mastodon)", other),
            }),
        }
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformKind::Twitter => write!(f, "twitter"),
            PlatformKind::Mastodon => write!(f, "mastodon"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub platform: PlatformKind,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the database files, or `:memory:`
    pub url: String,
    /// Logical database name; the file is `<url>/<database>.db`
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "~/.local/share/feedcast".to_string(),
            database: "feedcast".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub twitter: Option<TwitterCredentials>,
    pub mastodon: Option<MastodonCredentials>,
}

/// OAuth 1.0a user-context credentials
#[derive(Debug, Clone)]
pub struct TwitterCredentials {
    pub consumer_key: SecretString,
    pub consumer_secret: SecretString,
    pub access_token: SecretString,
    pub access_token_secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct MastodonCredentials {
    pub instance: String,
    pub access_token: SecretString,
}

impl Config {
    /// Load configuration from the default location, then apply the
    /// process environment
    ///
    /// A missing config file is not an error; everything can come from the
    /// environment.
    pub fn load() -> Result<Self> {
        let path = resolve_config_path()?;
        Self::load_with_env(Some(&path), |key| std::env::var(key).ok())
    }

    /// Load configuration from `path` (if it exists) and apply overrides
    /// from `lookup`
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) if path.exists() => Self::load_from_path(path)?,
            _ => Self::default(),
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Override settings with values from `lookup`
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_FEED_URL) {
            self.feed.url = url;
        }
        if let Some(url) = get(ENV_STORE_URL) {
            self.store.url = url;
        }
        if let Some(database) = get(ENV_STORE_DB) {
            self.store.database = database;
        }
        if let Some(mode) = get(ENV_ENVIRONMENT) {
            self.mode = Mode::from_env_value(&mode);
        }
        if let Some(platform) = get(ENV_PLATFORM) {
            self.platform = platform.parse()?;
        }

        if let (Some(consumer_key), Some(consumer_secret), Some(access_token), Some(access_token_secret)) = (
            get(ENV_TWITTER_CONSUMER_KEY),
            get(ENV_TWITTER_CONSUMER_SECRET),
            get(ENV_TWITTER_ACCESS_TOKEN),
            get(ENV_TWITTER_ACCESS_TOKEN_SECRET),
        ) {
            self.credentials.twitter = Some(TwitterCredentials {
                consumer_key: consumer_key.into(),
                consumer_secret: consumer_secret.into(),
                access_token: access_token.into(),
                access_token_secret: access_token_secret.into(),
            });
        }

        if let (Some(instance), Some(access_token)) =
            (get(ENV_MASTODON_INSTANCE), get(ENV_MASTODON_ACCESS_TOKEN))
        {
            self.credentials.mastodon = Some(MastodonCredentials {
                instance,
                access_token: access_token.into(),
            });
        }

        Ok(())
    }

    /// Check that everything an invocation needs is present
    pub fn validate(&self) -> Result<()> {
        if self.feed.url.trim().is_empty() {
            return Err(ConfigError::MissingField(format!("feed.url ({})", ENV_FEED_URL)).into());
        }
        match reqwest::Url::parse(&self.feed.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::InvalidValue {
                    field: "feed.url".to_string(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                }
                .into())
            }
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    field: "feed.url".to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
        }

        if self.store.url.trim().is_empty() {
            return Err(ConfigError::MissingField(format!("store.url ({})", ENV_STORE_URL)).into());
        }
        validate_database_name(&self.store.database)?;

        match self.platform {
            PlatformKind::Twitter if self.credentials.twitter.is_none() => {
                Err(ConfigError::MissingField(format!(
                    "twitter credentials ({}, {}, {}, {})",
                    ENV_TWITTER_CONSUMER_KEY,
                    ENV_TWITTER_CONSUMER_SECRET,
                    ENV_TWITTER_ACCESS_TOKEN,
                    ENV_TWITTER_ACCESS_TOKEN_SECRET
                ))
                .into())
            }
            PlatformKind::Mastodon if self.credentials.mastodon.is_none() => {
                Err(ConfigError::MissingField(format!(
                    "mastodon credentials ({}, {})",
                    ENV_MASTODON_INSTANCE, ENV_MASTODON_ACCESS_TOKEN
                ))
                .into())
            }
            _ => Ok(()),
        }
    }
}

/// Database names become file names, so keep them to a safe alphabet
pub fn validate_database_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "store.database".to_string(),
            reason: "must not be empty".to_string(),
        }
        .into());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::InvalidValue {
            field: "store.database".to_string(),
            reason: format!("'{}' may only contain letters, digits, '_' and '-'", name),
        }
        .into());
    }
    Ok(())
}

/// Config file path: `FEEDCAST_CONFIG`, else `<config dir>/feedcast/config.toml`
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("feedcast").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn twitter_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_FEED_URL, "https://example.com/feed.xml"),
            (ENV_TWITTER_CONSUMER_KEY, "ck"),
            (ENV_TWITTER_CONSUMER_SECRET, "cs"),
            (ENV_TWITTER_ACCESS_TOKEN, "at"),
            (ENV_TWITTER_ACCESS_TOKEN_SECRET, "ats"),
        ]
    }

    #[test]
    fn test_mode_from_env_value() {
        assert_eq!(Mode::from_env_value("development"), Mode::Development);
        assert_eq!(Mode::from_env_value("DEV"), Mode::Development);
        assert_eq!(Mode::from_env_value("production"), Mode::Production);
        assert_eq!(Mode::from_env_value("staging"), Mode::Production);
        assert!(Mode::Development.is_dry_run());
        assert!(!Mode::Production.is_dry_run());
    }

    #[test]
    fn test_platform_kind_from_str() {
        assert_eq!("twitter".parse::<PlatformKind>().unwrap(), PlatformKind::Twitter);
        assert_eq!("Mastodon".parse::<PlatformKind>().unwrap(), PlatformKind::Mastodon);
        assert!("myspace".parse::<PlatformKind>().is_err());
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = Config::load_with_env(None, lookup_from(&twitter_env())).unwrap();

        assert_eq!(config.feed.url, "https://example.com/feed.xml");
        assert_eq!(config.store.database, "feedcast");
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.platform, PlatformKind::Twitter);

        let twitter = config.credentials.twitter.as_ref().unwrap();
        assert_eq!(twitter.consumer_key.expose_secret(), "ck");
        assert_eq!(twitter.access_token_secret.expose_secret(), "ats");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_twitter_credentials_are_ignored() {
        let config = Config::load_with_env(
            None,
            lookup_from(&[
                (ENV_FEED_URL, "https://example.com/feed.xml"),
                (ENV_TWITTER_CONSUMER_KEY, "ck"),
            ]),
        )
        .unwrap();

        assert!(config.credentials.twitter.is_none());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("twitter credentials"));
    }

    #[test]
    fn test_missing_feed_url() {
        let config = Config::load_with_env(None, lookup_from(&[])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Missing required field: feed.url"));
    }

    #[test]
    fn test_invalid_feed_url_scheme() {
        let mut env = twitter_env();
        env[0] = (ENV_FEED_URL, "ftp://example.com/feed.xml");
        let config = Config::load_with_env(None, lookup_from(&env)).unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn test_database_name_validation() {
        assert!(validate_database_name("tweets").is_ok());
        assert!(validate_database_name("my-feed_2").is_ok());
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name("../escape").is_err());
        assert!(validate_database_name("a b").is_err());
    }

    #[test]
    fn test_mastodon_requires_its_credentials() {
        let config = Config::load_with_env(
            None,
            lookup_from(&[
                (ENV_FEED_URL, "https://example.com/feed.xml"),
                (ENV_PLATFORM, "mastodon"),
            ]),
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = Config::load_with_env(
            None,
            lookup_from(&[
                (ENV_FEED_URL, "https://example.com/feed.xml"),
                (ENV_PLATFORM, "mastodon"),
                (ENV_MASTODON_INSTANCE, "mastodon.social"),
                (ENV_MASTODON_ACCESS_TOKEN, "token"),
            ]),
        )
        .unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_toml_then_env() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
mode = "development"
platform = "mastodon"

[feed]
url = "https://blog.example.com/atom.xml"

[store]
url = "/var/lib/feedcast"
database = "blog"
"#,
        )
        .unwrap();

        let config =
            Config::load_with_env(Some(&path), lookup_from(&[(ENV_STORE_DB, "override")])).unwrap();

        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.platform, PlatformKind::Mastodon);
        assert_eq!(config.feed.url, "https://blog.example.com/atom.xml");
        assert_eq!(config.store.url, "/var/lib/feedcast");
        assert_eq!(config.store.database, "override");
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        let result = Config::load_with_env(None, lookup_from(&[(ENV_PLATFORM, "myspace")]));
        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("unknown platform 'myspace'"));
    }

    #[test]
    fn test_empty_env_values_are_unset() {
        let config =
            Config::load_with_env(None, lookup_from(&[(ENV_STORE_DB, ""), (ENV_ENVIRONMENT, " ")]))
                .unwrap();
        assert_eq!(config.store.database, "feedcast");
        assert_eq!(config.mode, Mode::Production);
    }

    #[test]
    fn test_credentials_not_serialized() {
        let config = Config::load_with_env(None, lookup_from(&twitter_env())).unwrap();
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("ck"));
        assert!(!toml.contains("credentials"));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_from_env() {
        std::env::set_var(ENV_CONFIG, "/etc/feedcast/custom.toml");
        let path = resolve_config_path();
        std::env::remove_var(ENV_CONFIG);

        assert_eq!(path.unwrap(), PathBuf::from("/etc/feedcast/custom.toml"));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_default() {
        std::env::remove_var(ENV_CONFIG);

        if let Ok(path) = resolve_config_path() {
            assert!(path.ends_with("feedcast/config.toml"));
        }
    }
}
