//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use card_tracker::domain::SystemTag;
use card_tracker::domain::ports::AuthBridge;
use card_tracker::outbound::auth::ApiTokenAuthBridge;
use card_tracker::outbound::persistence::DbPool;
use card_tracker::outbound::redis::RedisPool;

/// Builder-style configuration for creating the HTTP server.
///
/// Adapters are chosen from what is attached: a database pool selects
/// PostgreSQL persistence, a Redis pool selects the Redis cache and queue.
/// Without them the server runs on in-memory state.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) source: SystemTag,
    pub(crate) tokens: Arc<dyn AuthBridge>,
    pub(crate) cache_namespace: String,
    pub(crate) cache_ttl: Option<Duration>,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) redis_pool: Option<RedisPool>,
}

impl ServerConfig {
    /// Session cookie settings, listen address and the tag outgoing messages
    /// are signed with. No tokens are accepted until [`Self::with_tokens`].
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: SocketAddr,
        source: SystemTag,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            source,
            tokens: Arc::new(ApiTokenAuthBridge::new()),
            cache_namespace: "cards".to_owned(),
            cache_ttl: None,
            db_pool: None,
            redis_pool: None,
        }
    }

    /// Bridge resolving bearer tokens.
    #[must_use]
    pub fn with_tokens(mut self, tokens: Arc<dyn AuthBridge>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Cache key namespace and default TTL.
    #[must_use]
    pub fn with_cache(mut self, namespace: impl Into<String>, ttl: Option<Duration>) -> Self {
        self.cache_namespace = namespace.into();
        self.cache_ttl = ttl;
        self
    }

    /// Persist collection items in PostgreSQL.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Cache and dispatch messages through Redis.
    #[must_use]
    pub fn with_redis_pool(mut self, pool: RedisPool) -> Self {
        self.redis_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
