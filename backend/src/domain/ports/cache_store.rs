//! Port interface for a key/value cache with per-key expiry.
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{CacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by cache adapters.
    pub enum CacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "cache backend failure: {message}",
        /// Stored content could not be encoded or decoded.
        Serialization { message: String } => "cache serialisation failed: {message}",
    }
}

/// Key/value store holding JSON documents.
///
/// A `ttl` of `None` stores the entry without expiry. Expired entries behave
/// exactly like missing ones.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read an unexpired entry.
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, CacheError>;

    /// Write an entry, replacing any previous value and expiry.
    async fn set(&self, key: &CacheKey, value: Value, ttl: Option<Duration>)
    -> Result<(), CacheError>;

    /// Delete an entry; `Ok(true)` when something was removed.
    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Whether an unexpired entry exists.
    async fn has(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Drop every entry owned by this store.
    async fn clear(&self) -> Result<(), CacheError>;
}
