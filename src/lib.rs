//! Quarry: a distributed-frontier web crawler
//!
//! This crate implements a same-site web crawler whose queue of record lives
//! in an external key-value store. The frontier is split into four disjoint
//! namespaces (`todo`, `doing`, `done`, `trash`), so a crawl can be resumed,
//! inspected, or driven by several processes against the same backing store.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod frontier;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Quarry operations
#[derive(Debug, Error)]
pub enum QuarryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] frontier::StoreError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid extraction rules: {0}")]
    ExtractionRules(String),

    #[error("No settings found in the store; run with --set and a [scope] section first")]
    NoSettings,

    #[error("Blocked {count} consecutive times (HTTP 403), aborting the crawl")]
    Blocked { count: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Quarry operations
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, Settings};
pub use crawler::Crawler;
pub use frontier::{EnqueueMode, Frontier, Namespace};
pub use self::url::{filter_links, normalize_url};
