//! Typed get-or-compute caching over a [`CacheStore`].
//!
//! Values are stored as JSON. Every store failure is logged at `warn` and
//! treated as a miss (reads) or as `false`/`None` (writes), so a cache outage
//! slows requests down without failing them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::ports::{CacheKey, CacheStore};

/// Cache facade used by services.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    default_ttl: Option<Duration>,
}

impl CacheManager {
    /// Wrap `store`; `default_ttl` is what [`CacheManager::remember_default`]
    /// applies.
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Option<Duration>) -> Self {
        Self { store, default_ttl }
    }

    /// TTL applied by [`CacheManager::remember_default`].
    #[must_use]
    pub const fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Return the cached value for `key`, or run `compute` once and cache its
    /// result for `ttl` (`None` keeps it until deleted).
    ///
    /// Errors from `compute` are returned unchanged and nothing is cached.
    ///
    /// # Errors
    /// Only the error produced by `compute`.
    pub async fn get<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        compute: F,
        ttl: Option<Duration>,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.fetch(key).await {
            debug!(%key, "cache hit");
            return Ok(hit);
        }
        debug!(%key, "cache miss");
        let value = compute().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }

    /// [`CacheManager::get`] with the arguments in "remember" order.
    ///
    /// # Errors
    /// Only the error produced by `compute`.
    pub async fn remember<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get(key, compute, ttl).await
    }

    /// [`CacheManager::remember`] using the configured default TTL.
    ///
    /// # Errors
    /// Only the error produced by `compute`.
    pub async fn remember_default<T, E, F, Fut>(&self, key: &CacheKey, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get(key, compute, self.default_ttl).await
    }

    /// [`CacheManager::remember`] without expiry.
    ///
    /// # Errors
    /// Only the error produced by `compute`.
    pub async fn remember_forever<T, E, F, Fut>(&self, key: &CacheKey, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get(key, compute, None).await
    }

    /// Cached value, if present, unexpired and decodable as `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(error) => {
                warn!(%key, %error, "cache read failed");
                return None;
            }
        };
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(%key, %error, "cached value has an unexpected shape");
                None
            }
        }
    }

    /// Store `value`; `false` when it could not be encoded or written.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Option<Duration>,
    ) -> bool {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(error) => {
                warn!(%key, %error, "value could not be encoded for the cache");
                return false;
            }
        };
        self.write(key, encoded, ttl).await
    }

    /// Whether an unexpired entry exists.
    pub async fn has(&self, key: &CacheKey) -> bool {
        self.store.has(key).await.unwrap_or_else(|error| {
            warn!(%key, %error, "cache lookup failed");
            false
        })
    }

    /// Delete one entry; `true` when the store call succeeded.
    pub async fn delete(&self, key: &CacheKey) -> bool {
        match self.store.delete(key).await {
            Ok(_) => true,
            Err(error) => {
                warn!(%key, %error, "cache delete failed");
                false
            }
        }
    }

    /// Delete every key, attempting all of them; `true` only if all
    /// deletions succeeded.
    pub async fn delete_multiple<'a, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a CacheKey>,
    {
        let mut all = true;
        for key in keys {
            all &= self.delete(key).await;
        }
        all
    }

    /// Drop every entry in the store.
    pub async fn clear(&self) -> bool {
        match self.store.clear().await {
            Ok(()) => true,
            Err(error) => {
                warn!(%error, "cache clear failed");
                false
            }
        }
    }

    /// Read then delete.
    pub async fn pull<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let value = self.fetch(key).await;
        self.delete(key).await;
        value
    }

    /// Add `by` to the integer stored at `key` (missing counts as zero) and
    /// return the new value; `None` when the store failed.
    ///
    /// This is a read followed by a write, not an atomic operation: two
    /// concurrent increments of the same key may lose one update. The result
    /// is stored without expiry. A stored value that is not an integer is
    /// logged and replaced, counting from zero.
    pub async fn increment(&self, key: &CacheKey, by: i64) -> Option<i64> {
        let current = match self.store.get(key).await {
            Ok(None) => 0,
            Ok(Some(raw)) => raw.as_i64().unwrap_or_else(|| {
                warn!(%key, found = %raw, "cached counter is not an integer; restarting at zero");
                0
            }),
            Err(error) => {
                warn!(%key, %error, "cache read failed");
                return None;
            }
        };
        let next = current.saturating_add(by);
        self.write(key, Value::from(next), None).await.then_some(next)
    }

    /// Subtract `by`; see [`CacheManager::increment`].
    pub async fn decrement(&self, key: &CacheKey, by: i64) -> Option<i64> {
        self.increment(key, by.saturating_neg()).await
    }

    async fn write(&self, key: &CacheKey, value: Value, ttl: Option<Duration>) -> bool {
        match self.store.set(key, value, ttl).await {
            Ok(()) => true,
            Err(error) => {
                warn!(%key, %error, "cache write failed");
                false
            }
        }
    }
}
