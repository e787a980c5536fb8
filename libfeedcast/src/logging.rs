//! Logging configuration shared by the Feedcast binaries
//!
//! The configuration is an explicit value built by the entry point and
//! handed to [`LoggingConfig::init`]; library code only emits `tracing`
//! events and never touches the subscriber.
//!
//! # Examples
//!
//! ```no_run
//! use libfeedcast::logging::{LogFormat, LoggingConfig};
//! use libfeedcast::Mode;
//!
//! let config = LoggingConfig::new(LogFormat::Json, "info".to_string(), false)
//!     .for_mode(Mode::Development);
//! config.init();
//! ```

use std::str::FromStr;

use crate::config::Mode;

pub const ENV_LOG_FORMAT: &str = "FEEDCAST_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "FEEDCAST_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One plain line per event
    Text,
    /// One JSON object per line, for log shippers
    Json,
    /// Multi-line, colored, with source locations
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// How the binaries set up tracing output
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    /// `level` is an `EnvFilter` directive; `verbose` overrides it with "debug"
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Build from `FEEDCAST_LOG_FORMAT` and `FEEDCAST_LOG_LEVEL`
    ///
    /// Falls back to text format at info level.
    pub fn from_env() -> Self {
        let format = std::env::var(ENV_LOG_FORMAT)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogFormat::Text);

        let level = std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string());

        Self::new(format, level, false)
    }

    /// Development runs log at debug level
    pub fn for_mode(mut self, mode: Mode) -> Self {
        if mode.is_dry_run() {
            self.verbose = true;
        }
        self
    }

    /// The filter directive used when `RUST_LOG` is not set
    pub fn effective_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.level
        }
    }

    /// Install the global subscriber on stderr
    ///
    /// Call once at the start of the program. A second call is ignored.
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.effective_level()));

        let result = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .try_init(),
        };

        if let Err(e) = result {
            eprintln!("Logging already initialized: {}", e);
        }
    }
}
