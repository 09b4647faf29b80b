//! Configuration loading and validation
//!
//! Instance configuration (store location, worker counts, HTTP options) comes
//! from a TOML file. Scope settings (base URL, filters, extraction rules) are
//! part of the same file but are persisted into the store so every process
//! working on the frontier agrees on them.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, CrawlerConfig, Settings, StoreConfig, StoredSettings};
pub use validation::validate;
