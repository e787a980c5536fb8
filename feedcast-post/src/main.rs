//! feedcast-post - Publish new feed items to a social platform

use clap::Parser;
use libfeedcast::logging::{LogFormat, LoggingConfig};
use libfeedcast::service::run_invocation;
use libfeedcast::{Config, Mode, PassSummary, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "feedcast-post")]
#[command(version, about = "Publish new feed items to a social platform")]
#[command(long_about = r#"Fetch the configured feed once, post every item that has not been
published before, and record each published URL.

Configuration is read from the config file (if present) and then from the
environment. FEEDCAST_FEED_URL is the only required setting; platform
credentials come from TWITTER_* or MASTODON_* variables.

EXAMPLES:
    # One pass with the default config
    feedcast-post

    # Record new items without posting them
    feedcast-post --dry-run

    # Summary as JSON for scripting
    feedcast-post --format json | jq '.published'

EXIT CODES:
    0 - Success (including nothing new to publish)
    1 - Feed, store, or posting error
    2 - Missing or invalid configuration, or rejected credentials
"#)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, env = "FEEDCAST_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Record new items without posting them
    #[arg(long)]
    dry_run: bool,

    /// Output format for the summary
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Log output format
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if cli.dry_run {
        config.mode = Mode::Development;
    }

    let mut logging = LoggingConfig::from_env().for_mode(config.mode);
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    logging.verbose |= cli.verbose;
    logging.init();

    tracing::debug!(
        platform = %config.platform,
        mode = %config.mode,
        feed = %config.feed.url,
        "feedcast-post started"
    );

    let summary = run_invocation(&config).await?;
    print_summary(&summary, &cli.format);

    Ok(())
}

/// An explicit path must exist; the default location is optional
fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let env = |key: &str| std::env::var(key).ok();

    match path {
        Some(path) => {
            let mut config = Config::load_from_path(path)?;
            config.apply_env(env)?;
            Ok(config)
        }
        None => Config::load(),
    }
}

fn print_summary(summary: &PassSummary, format: &str) {
    match format {
        "json" => match serde_json::to_string(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize summary: {}", e),
        },
        _ => {
            println!("{} items were published", summary.published);
            if summary.skipped > 0 {
                println!("{} already published", summary.skipped);
            }
        }
    }
}
