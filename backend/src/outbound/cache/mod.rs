//! [`CacheStore`](crate::domain::ports::CacheStore) adapters.
//!
//! - [`InMemoryCacheStore`]: per-process, expiry driven by the injected clock.
//! - [`RedisCacheStore`]: shared, expiry delegated to Redis `EX`.

mod in_memory;
mod redis_store;

pub use in_memory::InMemoryCacheStore;
pub use redis_store::RedisCacheStore;
