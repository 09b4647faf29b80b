//! Quarry main entry point
//!
//! Command-line interface for the Quarry distributed-frontier crawler.

use anyhow::Context;
use clap::Parser;
use quarry::config::load_config_with_hash;
use quarry::{Crawler, EnqueueMode};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Quarry: a distributed-frontier web crawler
///
/// Quarry crawls a site concurrently against a shared key-value frontier,
/// extracting structured data and links as it goes. The frontier persists in
/// the store, so crawls can be stopped, resumed, and inspected at any time.
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(version = "1.0.0")]
#[command(about = "A distributed-frontier web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Persist the [scope] settings to the store without crawling
    #[arg(long, conflicts_with_all = ["dump", "dump_done", "requeue"])]
    set: bool,

    /// Erase the four frontier namespaces before crawling
    #[arg(long)]
    flush: bool,

    /// Move doing/trash back to todo (crash recovery) and exit
    #[arg(long, conflicts_with_all = ["dump", "dump_done", "set"])]
    requeue: bool,

    /// Print every known URL across all namespaces and exit
    #[arg(long, conflicts_with_all = ["dump_done", "requeue", "set"])]
    dump: bool,

    /// Print completed URLs with their extracted payloads as JSON and exit
    #[arg(long, conflicts_with_all = ["dump", "requeue", "set"])]
    dump_done: bool,

    /// File of seed URLs to add before crawling, one per line
    #[arg(long, value_name = "FILE")]
    seed_file: Option<PathBuf>,

    /// Add seeds even when they are already present in the frontier
    #[arg(long, requires = "seed_file")]
    force_seeds: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("loading configuration from {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::debug!("configuration hash: {}", config_hash);

    let crawler = Crawler::new(config, Some(config_hash))
        .await
        .context("failed to initialize crawler")?;

    if cli.set {
        // Settings were persisted during initialization.
        println!("Settings saved for {}", crawler.settings().base_url);
        return Ok(());
    }
    if cli.requeue {
        let moved = crawler.requeue_in_flight().await?;
        println!("Restored {} URLs to todo", moved);
        return Ok(());
    }
    if cli.dump {
        for url in crawler.export_all().await? {
            println!("{}", url);
        }
        return Ok(());
    }
    if cli.dump_done {
        let done = crawler.export_done().await?;
        println!("{}", serde_json::to_string_pretty(&done)?);
        return Ok(());
    }

    if cli.flush {
        crawler.flush().await?;
    }

    if let Some(seed_file) = &cli.seed_file {
        let seeds = read_seed_file(seed_file)?;
        let mode = if cli.force_seeds {
            EnqueueMode::Force
        } else {
            EnqueueMode::Dedup
        };
        crawler.add_seeds(&seeds, mode).await?;
    }

    crawler.seed_base_url().await?;
    crawler.run().await?;
    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("quarry=info,warn"),
            1 => EnvFilter::new("quarry=debug,info"),
            2 => EnvFilter::new("quarry=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Reads seed URLs from a file, one per line, skipping blanks and comments
fn read_seed_file(path: &PathBuf) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
