//! Test utilities shared by unit tests and the `tests/` integration suites.
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::{
    AuthenticatedUser, BearerToken, CacheManager, ChannelName, CollectionItem, CollectionService,
    DOMAIN_EVENTS_CHANNEL, DisplayName, EntityRepository, GatewayEventDispatcher,
    IntegrationGateway, SystemTag, UserId,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::auth::ApiTokenAuthBridge;
use crate::outbound::cache::InMemoryCacheStore;
use crate::outbound::persistence::InMemoryBackend;
use crate::outbound::queue::InMemoryQueueBridge;

/// Bearer token registered by [`InMemoryHarness`].
pub const TEST_TOKEN: &str = "test-token-0123456789abcdef";
/// Tag the harness signs payloads with.
pub const TEST_SOURCE: &str = "card-tracker";

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.advance(TimeDelta::seconds(seconds));
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// The user [`TEST_TOKEN`] resolves to.
///
/// # Panics
/// Never for the fixed values used here.
#[must_use]
pub fn test_user() -> AuthenticatedUser {
    let id = UserId::new("collector-1");
    let name = DisplayName::new("Ada Lovelace");
    match (id, name) {
        (Ok(id), Ok(name)) => AuthenticatedUser::new(id, name, vec!["collector".to_owned()]),
        _ => panic!("fixture user must be valid"),
    }
}

/// Application state over in-memory adapters, with handles to inspect them.
pub struct InMemoryHarness {
    /// State to register with `web::Data`.
    pub state: HttpState,
    /// Stored items.
    pub backend: Arc<InMemoryBackend<CollectionItem>>,
    /// Dispatched messages, including published domain events.
    pub queue: Arc<InMemoryQueueBridge>,
    /// Token table; [`TEST_TOKEN`] is pre-registered.
    pub tokens: Arc<ApiTokenAuthBridge>,
}

impl InMemoryHarness {
    /// Harness on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    /// Harness on `clock`.
    ///
    /// # Panics
    /// Never for the fixed tags and token used here.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (Ok(source), Ok(channel), Ok(token)) = (
            SystemTag::new(TEST_SOURCE),
            ChannelName::new(DOMAIN_EVENTS_CHANNEL),
            BearerToken::new(TEST_TOKEN),
        ) else {
            panic!("fixture values must be valid");
        };

        let backend = Arc::new(InMemoryBackend::<CollectionItem>::new());
        let queue = Arc::new(InMemoryQueueBridge::new());
        let tokens = Arc::new(ApiTokenAuthBridge::new());
        tokens.insert(&token, test_user());

        let gateway = IntegrationGateway::new(Arc::clone(&tokens) as _, Arc::clone(&queue) as _);
        let dispatcher = GatewayEventDispatcher::new(
            gateway.clone(),
            source.clone(),
            channel,
            Arc::clone(&clock),
        );
        let repository = EntityRepository::<CollectionItem>::new(
            Arc::clone(&backend) as _,
            Arc::clone(&clock),
            Arc::new(dispatcher),
        );
        let cache = CacheManager::new(Arc::new(InMemoryCacheStore::new(Arc::clone(&clock))), None);
        let items = CollectionService::new(Arc::new(repository), cache, Arc::clone(&clock));

        Self {
            state: HttpState::new(items, gateway, clock, source),
            backend,
            queue,
            tokens,
        }
    }
}

impl Default for InMemoryHarness {
    fn default() -> Self {
        Self::new()
    }
}
