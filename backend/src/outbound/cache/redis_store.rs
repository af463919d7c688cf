//! Redis-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::{self, AsyncCommands};
use serde_json::Value;
use tracing::debug;

use crate::domain::ports::{CacheError, CacheKey, CacheStore};
use crate::outbound::redis::{RedisPool, RedisPoolError};

const SCAN_BATCH: usize = 200;

/// [`CacheStore`] over Redis strings holding JSON.
///
/// Every key is stored as `<namespace>:<key>` so [`CacheStore::clear`] only
/// removes entries this store owns. TTLs are rounded up to whole seconds.
#[derive(Clone)]
pub struct RedisCacheStore {
    pool: RedisPool,
    namespace: String,
}

impl RedisCacheStore {
    /// Store entries under `namespace`.
    pub fn new(pool: RedisPool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }

    fn physical(&self, key: &CacheKey) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

fn ttl_seconds(ttl: Duration) -> u64 {
    let whole = ttl.as_secs();
    if ttl.subsec_nanos() > 0 || whole == 0 {
        whole.saturating_add(1)
    } else {
        whole
    }
}

fn backend(err: impl std::fmt::Display) -> CacheError {
    CacheError::backend(err.to_string())
}

impl From<RedisPoolError> for CacheError {
    fn from(err: RedisPoolError) -> Self {
        backend(err)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, CacheError> {
        let mut conn = self.pool.get().await?;
        let raw: Option<String> = conn.get(self.physical(key)).await.map_err(backend)?;
        raw.map(|text| {
            serde_json::from_str(&text).map_err(|err| CacheError::serialization(err.to_string()))
        })
        .transpose()
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let text = serde_json::to_string(&value)
            .map_err(|err| CacheError::serialization(err.to_string()))?;
        let mut conn = self.pool.get().await?;
        let physical = self.physical(key);
        match ttl {
            Some(ttl) => {
                let _: () = conn
                    .set_ex(physical, text, ttl_seconds(ttl))
                    .await
                    .map_err(backend)?;
            }
            None => {
                let _: () = conn.set(physical, text).await.map_err(backend)?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let mut conn = self.pool.get().await?;
        let removed: u64 = conn.del(self.physical(key)).await.map_err(backend)?;
        Ok(removed > 0)
    }

    async fn has(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let mut conn = self.pool.get().await?;
        conn.exists(self.physical(key)).await.map_err(backend)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn = self.pool.get().await?;
        let pattern = format!("{}:*", self.namespace);
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut *conn)
                .await
                .map_err(backend)?;
            if !keys.is_empty() {
                let count: u64 = conn.del(keys).await.map_err(backend)?;
                removed += count;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        debug!(namespace = %self.namespace, removed, "cache namespace cleared");
        Ok(())
    }
}
