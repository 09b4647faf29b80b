//! Backend trait for the key-value store holding the frontier
//!
//! Each frontier namespace maps to one instance of this trait. The trait is
//! deliberately small: the frontier only ever needs per-key get/set/delete,
//! bulk variants for batch moves, counting, random sampling, and a full scan.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable at {url}: {reason}")]
    Unavailable { url: String, reason: String },

    #[error("Store operation failed: {0}")]
    Operation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// One logical key space of the backing store
///
/// Implementations must be safe to call from many workers at once; every
/// method is a single round-trip with no cross-call state.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Gets the value for a key, or None if absent
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Sets a key to a value, overwriting any previous value
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deletes a key; deleting an absent key is not an error
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Sets many key/value pairs in one round-trip
    async fn bulk_set(&self, pairs: &[(String, String)]) -> StoreResult<()>;

    /// Deletes many keys in one round-trip
    async fn bulk_delete(&self, keys: &[String]) -> StoreResult<()>;

    /// Number of keys in this key space
    async fn len(&self) -> StoreResult<u64>;

    /// A uniformly random key, or None if the key space is empty
    async fn random_key(&self) -> StoreResult<Option<String>>;

    /// All keys in this key space
    async fn scan_keys(&self) -> StoreResult<Vec<String>>;

    /// Erases every key in this key space
    async fn flush_all(&self) -> StoreResult<()>;

    /// Connectivity check; used at startup to fail fast
    async fn ping(&self) -> StoreResult<()>;
}
