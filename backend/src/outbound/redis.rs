//! Shared bb8 pool of Redis connections for the cache and queue adapters.

use std::time::Duration;

use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection};

use crate::domain::ports::define_port_error;

define_port_error! {
    /// Redis pool construction and checkout failures.
    pub enum RedisPoolError {
        /// The connection URL was rejected or the pool could not start.
        Build { message: String } => "failed to build redis pool: {message}",
        /// No connection became available within the timeout.
        Checkout { message: String } => "failed to get redis connection: {message}",
    }
}

/// Cloneable handle to the Redis pool.
#[derive(Clone)]
pub struct RedisPool {
    inner: Pool<RedisConnectionManager>,
}

impl RedisPool {
    /// Connect lazily to `url`; connections open on first checkout.
    ///
    /// # Errors
    /// [`RedisPoolError::Build`] when the URL cannot be parsed.
    pub async fn connect(url: &str, max_size: u32) -> Result<Self, RedisPoolError> {
        let manager =
            RedisConnectionManager::new(url).map_err(|err| RedisPoolError::build(err.to_string()))?;
        let inner = Pool::builder()
            .max_size(max_size)
            .connection_timeout(Duration::from_secs(5))
            .build(manager)
            .await
            .map_err(|err| RedisPoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// [`RedisPoolError::Checkout`] on timeout or connection failure.
    pub async fn get(&self) -> Result<PooledConnection<'_, RedisConnectionManager>, RedisPoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| RedisPoolError::checkout(err.to_string()))
    }
}
