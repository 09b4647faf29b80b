//! In-memory key space
//!
//! Backs the test suite and single-process runs where no Redis is available.
//! Crawl state held here does not survive the process; everything else
//! behaves like the Redis backend.

use crate::frontier::backend::{KvBackend, StoreResult};
use async_trait::async_trait;
use rand::seq::IteratorRandom;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One in-memory key space
#[derive(Clone, Default)]
pub struct MemoryKv {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.data
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn bulk_set(&self, pairs: &[(String, String)]) -> StoreResult<()> {
        let mut data = self.data.write().await;
        for (key, value) in pairs {
            data.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn bulk_delete(&self, keys: &[String]) -> StoreResult<()> {
        let mut data = self.data.write().await;
        for key in keys {
            data.remove(key);
        }
        Ok(())
    }

    async fn len(&self) -> StoreResult<u64> {
        Ok(self.data.read().await.len() as u64)
    }

    async fn random_key(&self) -> StoreResult<Option<String>> {
        let data = self.data.read().await;
        let mut rng = rand::thread_rng();
        Ok(data.keys().choose(&mut rng).cloned())
    }

    async fn scan_keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.data.read().await.keys().cloned().collect())
    }

    async fn flush_all(&self) -> StoreResult<()> {
        self.data.write().await.clear();
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let kv = MemoryKv::new();
        kv.set("k", "v").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), Some("v".to_string()));
        kv.delete("k").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bulk_ops_and_len() {
        let kv = MemoryKv::new();
        kv.bulk_set(&[
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
            ("c".to_string(), "3".to_string()),
        ])
        .await
        .unwrap();
        assert_eq!(kv.len().await.unwrap(), 3);

        kv.bulk_delete(&["a".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(kv.len().await.unwrap(), 1);
        assert_eq!(kv.get("b").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_random_key_empty_and_populated() {
        let kv = MemoryKv::new();
        assert_eq!(kv.random_key().await.unwrap(), None);

        kv.set("only", "").await.unwrap();
        assert_eq!(kv.random_key().await.unwrap(), Some("only".to_string()));
    }

    #[tokio::test]
    async fn test_flush_all() {
        let kv = MemoryKv::new();
        kv.set("a", "1").await.unwrap();
        kv.set("b", "2").await.unwrap();
        kv.flush_all().await.unwrap();
        assert_eq!(kv.len().await.unwrap(), 0);
    }
}
