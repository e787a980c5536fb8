//! Error types for Feedcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedcastError>;

#[derive(Error, Debug)]
pub enum FeedcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl FeedcastError {
    /// Returns the appropriate exit code for this error
    ///
    /// Anything that aborts the run before an item is processed because of
    /// bad setup (configuration, credentials) exits with 2; runtime failures
    /// exit with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            FeedcastError::Config(_) => 2,
            FeedcastError::Platform(PlatformError::Authentication(_)) => 2,
            FeedcastError::Platform(_) => 1,
            FeedcastError::Store(_) => 1,
            FeedcastError::Feed(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Item already recorded: {url}")]
    DuplicateKey { url: String },
}

impl StoreError {
    /// Classify an insert failure, mapping unique-constraint violations on
    /// the url column to `DuplicateKey`.
    pub fn from_insert(error: sqlx::Error, url: &str) -> Self {
        match &error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                StoreError::DuplicateKey {
                    url: url.to_string(),
                }
            }
            _ => StoreError::SqlxError(error),
        }
    }

    /// Whether this error is the recoverable duplicate-record conflict
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    #[error("Response exceeds {0} bytes")]
    ResponseTooLarge(usize),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}
