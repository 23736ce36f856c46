//! memo-stats - inspect a persistent memo cache file
//!
//! Prints the number of cached results and how long ago the least and most
//! recently used results were accessed. The cache file is never modified.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use persistent_memo::cache::now_timestamp;
use persistent_memo::report::StatsReport;
use persistent_memo::{Cache, Config};

/// Show usage statistics of a persistent memo cache.
#[derive(Parser, Debug)]
#[command(name = "memo-stats", version)]
struct Cli {
    /// Cache file (defaults to MEMO_CACHE_PATH, then .memo-cache.json)
    path: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "warn" so reports stay clean, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "persistent_memo=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let path = cli.path.unwrap_or(config.cache_path);
    debug!("Inspecting {}", path.display());

    if !path.exists() {
        bail!("no such cache file: {}", path.display());
    }

    let cache =
        Cache::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let stats = cache.stats()?;
    cache.close()?;

    let report = StatsReport::new(path.display().to_string(), &stats, now_timestamp());
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
