//! The URL frontier: four disjoint key namespaces over a shared store
//!
//! Every URL known to a crawl lives in exactly one of `todo`, `doing`,
//! `done`, or `trash` (the partition invariant). Moves between namespaces are
//! two separate backend calls with no transaction; a failure between the
//! halves may briefly leave a key in two namespaces, which callers tolerate,
//! but a key is never silently dropped: each failed half is logged and the
//! key remains in at least one namespace.

mod backend;
mod memory;
mod redis;

pub use self::backend::{KvBackend, StoreError, StoreResult};
pub use self::memory::MemoryKv;
pub use self::redis::RedisKv;

use crate::config::{Settings, StoredSettings};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Key under which the run's settings are stored in the reserved space
const SETTINGS_KEY: &str = "settings";

/// The four disjoint URL namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Discovered, waiting to be claimed
    Todo,
    /// Claimed by a dispatcher, in flight
    Doing,
    /// Fetched successfully; value holds the extracted payload
    Done,
    /// Permanently abandoned
    Trash,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::Todo,
        Namespace::Doing,
        Namespace::Done,
        Namespace::Trash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Todo => "todo",
            Namespace::Doing => "doing",
            Namespace::Done => "done",
            Namespace::Trash => "trash",
        }
    }
}

/// How `enqueue` treats a URL that is already known
///
/// The dedup probe is a best-effort existence check across all four
/// namespaces, not a transactional guarantee: two concurrent enqueues of the
/// same brand-new URL may both insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueMode {
    /// Skip the URL if it is present in any namespace
    Dedup,
    /// Insert into `todo` unconditionally
    Force,
}

/// Snapshot of the four namespace sizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamespaceSizes {
    pub todo: u64,
    pub doing: u64,
    pub done: u64,
    pub trash: u64,
}

/// The frontier store: one facade over five backend key spaces
///
/// Four spaces hold the URL partition; the fifth is reserved for the
/// serialized run settings.
pub struct Frontier {
    todo: Arc<dyn KvBackend>,
    doing: Arc<dyn KvBackend>,
    done: Arc<dyn KvBackend>,
    trash: Arc<dyn KvBackend>,
    settings: Arc<dyn KvBackend>,
}

impl Frontier {
    /// Opens a Redis-backed frontier, one logical database per namespace
    ///
    /// Fails fast if the store is unreachable.
    pub async fn open_redis(url: &str) -> StoreResult<Self> {
        let frontier = Self {
            todo: Arc::new(RedisKv::open(url, 0).await?),
            doing: Arc::new(RedisKv::open(url, 1).await?),
            done: Arc::new(RedisKv::open(url, 2).await?),
            trash: Arc::new(RedisKv::open(url, 3).await?),
            settings: Arc::new(RedisKv::open(url, 4).await?),
        };
        frontier.settings.ping().await?;
        Ok(frontier)
    }

    /// Builds a frontier over in-memory key spaces
    pub fn in_memory() -> Self {
        Self {
            todo: Arc::new(MemoryKv::new()),
            doing: Arc::new(MemoryKv::new()),
            done: Arc::new(MemoryKv::new()),
            trash: Arc::new(MemoryKv::new()),
            settings: Arc::new(MemoryKv::new()),
        }
    }

    fn space(&self, ns: Namespace) -> &Arc<dyn KvBackend> {
        match ns {
            Namespace::Todo => &self.todo,
            Namespace::Doing => &self.doing,
            Namespace::Done => &self.done,
            Namespace::Trash => &self.trash,
        }
    }

    /// Inserts a URL into `todo`
    ///
    /// Returns true if the URL was inserted, false if it was deduplicated.
    pub async fn enqueue(&self, url: &str, mode: EnqueueMode) -> StoreResult<bool> {
        if mode == EnqueueMode::Dedup {
            for ns in Namespace::ALL {
                if self.space(ns).get(url).await?.is_some() {
                    return Ok(false);
                }
            }
        }
        self.todo.set(url, "").await?;
        Ok(true)
    }

    /// Checks whether a URL is present in the given namespace
    pub async fn contains(&self, ns: Namespace, url: &str) -> StoreResult<bool> {
        Ok(self.space(ns).get(url).await?.is_some())
    }

    /// Samples up to `n` distinct keys from `todo`
    ///
    /// Best-effort random: fewer keys are returned when `todo` is smaller
    /// than `n` or repeated sampling yields duplicates.
    pub async fn sample_todo(&self, n: usize) -> StoreResult<HashSet<String>> {
        let mut keys = HashSet::new();
        for _ in 0..n {
            match self.todo.random_key().await {
                Ok(Some(key)) => {
                    keys.insert(key);
                }
                Ok(None) => break,
                Err(e) => tracing::warn!("sampling todo failed: {}", e),
            }
        }
        Ok(keys)
    }

    /// Moves a batch of keys from `todo` to `doing`
    ///
    /// Two bulk calls with no transaction. Either half may fail; the failure
    /// is logged and the batch carries on, leaving the key in whichever
    /// namespace still holds it.
    pub async fn move_to_doing(&self, keys: &[String]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.todo.bulk_delete(keys).await {
            tracing::error!("problem removing batch from todo: {}", e);
        }

        let pairs: Vec<(String, String)> =
            keys.iter().map(|k| (k.clone(), String::new())).collect();
        if let Err(e) = self.doing.bulk_set(&pairs).await {
            tracing::error!("problem placing batch in doing: {}", e);
        }

        Ok(())
    }

    /// Marks a URL as successfully crawled, storing its extracted payload
    pub async fn complete(&self, url: &str, data: &str) -> StoreResult<()> {
        self.doing.delete(url).await?;
        self.done.set(url, data).await?;
        Ok(())
    }

    /// Returns a URL from `doing` to `todo` for another attempt
    pub async fn requeue(&self, url: &str) -> StoreResult<()> {
        self.doing.delete(url).await?;
        self.todo.set(url, "").await?;
        Ok(())
    }

    /// Permanently abandons a URL
    pub async fn discard(&self, url: &str) -> StoreResult<()> {
        self.doing.delete(url).await?;
        self.todo.delete(url).await?;
        self.trash.set(url, "").await?;
        Ok(())
    }

    /// Number of keys in one namespace
    pub async fn size(&self, ns: Namespace) -> StoreResult<u64> {
        self.space(ns).len().await
    }

    /// Snapshot of all four namespace sizes
    pub async fn sizes(&self) -> StoreResult<NamespaceSizes> {
        Ok(NamespaceSizes {
            todo: self.todo.len().await?,
            doing: self.doing.len().await?,
            done: self.done.len().await?,
            trash: self.trash.len().await?,
        })
    }

    /// Erases all four URL namespaces
    ///
    /// The stored settings survive: a flushed crawl restarts from the same
    /// scope without re-seeding its configuration.
    pub async fn flush(&self) -> StoreResult<()> {
        for ns in Namespace::ALL {
            self.space(ns).flush_all().await?;
        }
        Ok(())
    }

    /// Moves everything in `doing` and `trash` back to `todo`
    ///
    /// Recovery path for a crashed or previously abandoned run; batches left
    /// in `doing` by a dead process become claimable again and trashed URLs
    /// get another chance.
    pub async fn restore_in_flight(&self) -> StoreResult<u64> {
        let mut moved = 0;
        for ns in [Namespace::Doing, Namespace::Trash] {
            let keys = self.space(ns).scan_keys().await?;
            for key in keys {
                tracing::debug!("moving {} from {} back to todo", key, ns.as_str());
                if let Err(e) = self.space(ns).delete(&key).await {
                    tracing::error!("removing {} from {}: {}", key, ns.as_str(), e);
                }
                if let Err(e) = self.todo.set(&key, "").await {
                    tracing::error!("returning {} to todo: {}", key, e);
                    continue;
                }
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// All keys known to the frontier, across all four namespaces
    pub async fn export_all(&self) -> StoreResult<Vec<String>> {
        let mut all = Vec::new();
        for ns in Namespace::ALL {
            all.extend(self.space(ns).scan_keys().await?);
        }
        Ok(all)
    }

    /// URL to extracted-payload mapping for every completed page
    pub async fn export_done(&self) -> StoreResult<HashMap<String, String>> {
        let mut map = HashMap::new();
        for key in self.done.scan_keys().await? {
            if let Some(value) = self.done.get(&key).await? {
                map.insert(key, value);
            }
        }
        Ok(map)
    }

    /// Persists the run settings into the reserved space
    pub async fn save_settings(
        &self,
        settings: &Settings,
        config_hash: Option<String>,
    ) -> StoreResult<()> {
        let record = StoredSettings {
            settings: settings.clone(),
            config_hash,
            saved_at: chrono::Utc::now(),
        };
        let payload = serde_json::to_string(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.settings.set(SETTINGS_KEY, &payload).await
    }

    /// Loads previously persisted run settings, if any
    pub async fn load_settings(&self) -> StoreResult<Option<StoredSettings>> {
        match self.settings.get(SETTINGS_KEY).await? {
            Some(payload) => {
                let record: StoredSettings = serde_json::from_str(&payload)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Connectivity check against the backing store
    pub async fn ping(&self) -> StoreResult<()> {
        self.settings.ping().await
    }
}
