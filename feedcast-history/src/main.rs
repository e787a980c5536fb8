use anyhow::{bail, Context, Result};
use clap::Parser;
use libfeedcast::logging::LoggingConfig;
use libfeedcast::store::{database_path, ItemStore, SqliteStore, MEMORY_URL};
use libfeedcast::{Config, PublishedRecord};

#[derive(Parser, Debug)]
#[command(name = "feedcast-history")]
#[command(version, about = "List published feed items")]
#[command(long_about = r#"List the feed items feedcast has published, newest first.

The store location comes from the same configuration as feedcast-post
(config file, then FEEDCAST_STORE_URL and FEEDCAST_STORE_DB).

EXAMPLES:
    # Show the last 20 published items (default)
    feedcast-history

    # Show more
    feedcast-history --limit 100

    # JSON output for scripting
    feedcast-history --format json | jq -r '.[].url'

    # JSONL output (one JSON object per line)
    feedcast-history --format jsonl | grep example.com

OUTPUT FORMATS:
    text  - Timestamp, title and URL per line (default)
    json  - JSON array
    jsonl - JSON lines, one object per line (streaming-friendly)

EXIT CODES:
    0 - Success (including empty results)
    1 - Error (database not found, query failed, etc.)
"#)]
struct Args {
    /// Maximum number of records to return
    #[arg(short, long, default_value = "20", value_name = "N")]
    limit: usize,

    /// Output format
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json", "jsonl"])]
    format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    LoggingConfig::from_env().init();

    let args = Args::parse();
    tracing::debug!("feedcast-history started with args: {:?}", args);

    let config = Config::load().context("Failed to load configuration")?;
    let records = load_history(&config, args.limit).await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&records)?),
        "jsonl" => {
            for record in &records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        _ => {
            for record in &records {
                println!("{}", format_text(record));
            }
        }
    }

    Ok(())
}

async fn load_history(config: &Config, limit: usize) -> Result<Vec<PublishedRecord>> {
    if config.store.url != MEMORY_URL {
        let path = database_path(&config.store.url, &config.store.database);
        if !path.exists() {
            bail!(
                "Database not found at {}. Has feedcast-post run yet?",
                path.display()
            );
        }
    }

    let store = SqliteStore::open(&config.store)
        .await
        .context("Failed to open store")?;
    let records = store
        .recent(limit)
        .await
        .context("Failed to query published items")?;
    store.close().await;

    Ok(records)
}

fn format_text(record: &PublishedRecord) -> String {
    let timestamp = chrono::DateTime::from_timestamp(record.timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| record.timestamp.to_string());

    format!("{} | {} | {}", timestamp, record.title, record.url)
}
