//! Crawl engine: coordination, workers, fetching, and progress reporting

mod coordinator;
mod fetcher;
mod stats;
mod worker;

pub use coordinator::Crawler;
pub use fetcher::{build_http_client, fetch_url, FetchOutcome};
pub use stats::host_label;

use crate::config::Config;
use crate::Result;

/// Runs a complete crawl: seed the base URL, then crawl to quiescence
///
/// # Example
///
/// ```no_run
/// use quarry::config::load_config;
/// use quarry::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> quarry::Result<()> {
/// let config = load_config(Path::new("config.toml"))?;
/// crawl(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<()> {
    let crawler = Crawler::new(config, None).await?;
    crawler.seed_base_url().await?;
    crawler.run().await
}
