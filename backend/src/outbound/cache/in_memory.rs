//! DashMap-backed cache with clock-driven expiry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mockable::Clock;
use serde_json::Value;

use crate::domain::ports::{CacheError, CacheKey, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Per-process [`CacheStore`].
///
/// Expired entries are dropped lazily on access.
pub struct InMemoryCacheStore {
    entries: DashMap<CacheKey, Entry>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCacheStore {
    /// Empty cache reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    fn live(&self, key: &CacheKey) -> Option<Value> {
        let now = self.clock.utc();
        let value = self
            .entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()))?;
        if value.is_none() {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        value
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, CacheError> {
        Ok(self.live(key))
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let expires_at = match ttl {
            Some(ttl) => {
                let ttl = chrono::Duration::from_std(ttl)
                    .map_err(|err| CacheError::backend(format!("ttl out of range: {err}")))?;
                let at = self
                    .clock
                    .utc()
                    .checked_add_signed(ttl)
                    .ok_or_else(|| CacheError::backend("ttl overflows the clock"))?;
                Some(at)
            }
            None => None,
        };
        self.entries.insert(key.clone(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let now = self.clock.utc();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now)))
    }

    async fn has(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.live(key).is_some())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }
}
