//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_bridge;
mod cache_key;
mod cache_store;
mod event_dispatcher;
mod persistence_backend;
mod queue_bridge;
mod repository;

#[cfg(test)]
pub use auth_bridge::MockAuthBridge;
pub use auth_bridge::{AuthBridge, AuthBridgeError};
pub use cache_key::{CacheKey, CacheKeyValidationError};
#[cfg(test)]
pub use cache_store::MockCacheStore;
pub use cache_store::{CacheError, CacheStore};
#[cfg(test)]
pub use event_dispatcher::MockDomainEventDispatcher;
pub use event_dispatcher::{DomainEventDispatcher, EventDispatchError};
pub use persistence_backend::{PersistenceBackend, StagedWrite, UnitOfWork};
#[cfg(test)]
pub use queue_bridge::MockQueueBridge;
pub use queue_bridge::{JobDispatchError, QueueBridge};
pub use repository::{Repository, RepositoryError};
