//! Redis-backed key space
//!
//! Each frontier namespace maps to its own Redis logical database (index
//! 0-3, with the settings space at 4), mirroring how the frontier would be
//! laid out by other processes sharing the store.

use crate::frontier::backend::{KvBackend, StoreError, StoreResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Operation(err.to_string())
    }
}

/// One Redis logical database used as a frontier key space
pub struct RedisKv {
    connection: MultiplexedConnection,
    url: String,
}

impl RedisKv {
    /// Opens a connection to the given Redis URL and logical database index
    pub async fn open(url: &str, db: u8) -> StoreResult<Self> {
        let url = format!("{}/{}", url.trim_end_matches('/'), db);
        let client = redis::Client::open(url.as_str()).map_err(|e| StoreError::Unavailable {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Unavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { connection, url })
    }

    fn conn(&self) -> MultiplexedConnection {
        // MultiplexedConnection clones share one pipelined connection
        self.connection.clone()
    }
}

#[async_trait]
impl KvBackend for RedisKv {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.conn();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.conn();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn bulk_set(&self, pairs: &[(String, String)]) -> StoreResult<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        conn.mset::<_, _, ()>(pairs).await?;
        Ok(())
    }

    async fn bulk_delete(&self, keys: &[String]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }

    async fn len(&self) -> StoreResult<u64> {
        let mut conn = self.conn();
        let size: u64 = redis::cmd("DBSIZE").query_async(&mut conn).await?;
        Ok(size)
    }

    async fn random_key(&self) -> StoreResult<Option<String>> {
        let mut conn = self.conn();
        let key: Option<String> = redis::cmd("RANDOMKEY").query_async(&mut conn).await?;
        Ok(key)
    }

    async fn scan_keys(&self) -> StoreResult<Vec<String>> {
        let mut conn = self.conn();
        let mut keys = Vec::new();
        let mut iter: redis::AsyncIter<String> = conn.scan().await?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }

    async fn flush_all(&self) -> StoreResult<()> {
        let mut conn = self.conn();
        redis::cmd("FLUSHDB").query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| StoreError::Unavailable {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
