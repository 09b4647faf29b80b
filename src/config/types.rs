use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Main configuration structure for Quarry
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    /// Scope settings for the run. Optional: when absent, a previously
    /// persisted settings record is loaded from the store instead.
    pub scope: Option<Settings>,
}

/// Which key-value backend holds the frontier
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend kind: "redis" or "memory"
    #[serde(default = "default_store_kind")]
    pub kind: String,

    /// Connection URL for the redis backend
    #[serde(default = "default_store_url")]
    pub url: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Size of the HTTP connection pool
    #[serde(rename = "max-connections", default = "default_max_connections")]
    pub max_connections: usize,

    /// Backpressure cap: no new batch is dispatched while the `doing`
    /// namespace holds more keys than this
    #[serde(rename = "max-in-flight", default = "default_max_in_flight")]
    pub max_in_flight: u64,

    /// Consecutive HTTP 403 responses tolerated before the run is aborted
    #[serde(rename = "max-block-errors", default = "default_max_block_errors")]
    pub max_block_errors: u32,

    /// Seconds between progress lines
    #[serde(rename = "stats-interval", default = "default_stats_interval")]
    pub stats_interval: u64,

    /// Dispatcher poll interval in milliseconds; backpressure and quiescence
    /// grace waits are three times this
    #[serde(rename = "poll-interval", default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// User-Agent header sent with every request (empty = reqwest default)
    #[serde(rename = "user-agent", default)]
    pub user_agent: String,

    /// Cookie header sent with every request (empty = none)
    #[serde(default)]
    pub cookie: String,

    /// Optional SOCKS5 proxy URL, e.g. "socks5://127.0.0.1:9050"
    #[serde(default)]
    pub proxy: Option<String>,
}

/// Scope settings: what to crawl and what to keep.
///
/// Unlike [`Config`], these are shared across every process working on the
/// same frontier, so they are serialized into the store's reserved namespace
/// and reloaded by instances started without a `[scope]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL defining the crawl scope; links not containing it are dropped
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Extraction rule set (JSON list of named selectors); empty = no extraction
    #[serde(rename = "pluck-rules", default)]
    pub pluck_rules: String,

    /// Links containing any of these substrings are dropped
    #[serde(rename = "keywords-exclude", default)]
    pub keywords_exclude: Vec<String>,

    /// When non-empty, links must contain at least one of these substrings
    #[serde(rename = "keywords-include", default)]
    pub keywords_include: Vec<String>,

    /// Keep query strings on discovered links
    #[serde(rename = "allow-query", default)]
    pub allow_query: bool,

    /// Keep fragments on discovered links
    #[serde(rename = "allow-fragment", default)]
    pub allow_fragment: bool,

    /// Suppress link discovery entirely (fetch and extract only)
    #[serde(rename = "dont-follow-links", default)]
    pub dont_follow_links: bool,

    /// Treat a page with no extracted data as a failed fetch
    #[serde(rename = "require-extraction", default)]
    pub require_extraction: bool,
}

/// Settings record as persisted in the store's reserved namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSettings {
    pub settings: Settings,
    /// Hash of the config file the settings came from, for drift detection
    pub config_hash: Option<String>,
    pub saved_at: DateTime<Utc>,
}

fn default_store_kind() -> String {
    "redis".to_string()
}

fn default_store_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_workers() -> usize {
    8
}

fn default_max_connections() -> usize {
    20
}

fn default_max_in_flight() -> u64 {
    500
}

fn default_max_block_errors() -> u32 {
    20
}

fn default_stats_interval() -> u64 {
    1
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: default_store_kind(),
            url: default_store_url(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_connections: default_max_connections(),
            max_in_flight: default_max_in_flight(),
            max_block_errors: default_max_block_errors(),
            stats_interval: default_stats_interval(),
            poll_interval_ms: default_poll_interval(),
            user_agent: String::new(),
            cookie: String::new(),
            proxy: None,
        }
    }
}
