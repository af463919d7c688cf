//! Adapter selection and HTTP state assembly.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use card_tracker::domain::ports::{CacheStore, PersistenceBackend, QueueBridge};
use card_tracker::domain::{
    CacheManager, ChannelName, CollectionItem, CollectionService, DOMAIN_EVENTS_CHANNEL,
    EntityRepository, GatewayEventDispatcher, IntegrationGateway,
};
use card_tracker::inbound::http::state::HttpState;
use card_tracker::outbound::cache::{InMemoryCacheStore, RedisCacheStore};
use card_tracker::outbound::persistence::{DieselCollectionBackend, InMemoryBackend};
use card_tracker::outbound::queue::{RedisQueueBridge, StubQueueBridge};

use super::ServerConfig;

fn build_backend(config: &ServerConfig) -> Arc<dyn PersistenceBackend<CollectionItem>> {
    match &config.db_pool {
        Some(pool) => Arc::new(DieselCollectionBackend::new(pool.clone())),
        None => {
            warn!("no database configured; collection items are kept in memory");
            Arc::new(InMemoryBackend::<CollectionItem>::new())
        }
    }
}

fn build_cache_store(config: &ServerConfig, clock: &Arc<dyn Clock>) -> Arc<dyn CacheStore> {
    match &config.redis_pool {
        Some(pool) => Arc::new(RedisCacheStore::new(
            pool.clone(),
            config.cache_namespace.clone(),
        )),
        None => Arc::new(InMemoryCacheStore::new(Arc::clone(clock))),
    }
}

fn build_queue(config: &ServerConfig) -> Arc<dyn QueueBridge> {
    match &config.redis_pool {
        Some(pool) => Arc::new(RedisQueueBridge::new(pool.clone())),
        None => {
            warn!("no queue configured; outgoing messages are not delivered");
            Arc::new(StubQueueBridge)
        }
    }
}

/// Wire adapters, the gateway and the collection service into [`HttpState`].
///
/// # Errors
/// When the domain events channel name is rejected.
pub(crate) fn build_http_state(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> std::io::Result<HttpState> {
    let channel = ChannelName::new(DOMAIN_EVENTS_CHANNEL)
        .map_err(|err| std::io::Error::other(format!("invalid events channel: {err}")))?;

    let gateway = IntegrationGateway::new(Arc::clone(&config.tokens), build_queue(config));
    let dispatcher = GatewayEventDispatcher::new(
        gateway.clone(),
        config.source.clone(),
        channel,
        Arc::clone(&clock),
    );
    let repository = EntityRepository::<CollectionItem>::new(
        build_backend(config),
        Arc::clone(&clock),
        Arc::new(dispatcher),
    );
    let cache = CacheManager::new(build_cache_store(config, &clock), config.cache_ttl);
    let items = CollectionService::new(Arc::new(repository), cache, Arc::clone(&clock));

    info!(
        database = config.db_pool.is_some(),
        redis = config.redis_pool.is_some(),
        "http state assembled"
    );
    Ok(HttpState::new(items, gateway, clock, config.source.clone()))
}
