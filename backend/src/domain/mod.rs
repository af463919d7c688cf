//! Domain primitives, aggregates and services.
//!
//! Purpose: hold the transport-agnostic core. Entities and value objects
//! enforce their invariants on construction; services return [`Outcome`]s for
//! expected failures and [`Error`]s for faults; every external collaborator is
//! reached through a trait in [`ports`].
//!
//! Public surface:
//! - Entity, EntityCore, EntityId, DomainEvent: identity and event buffering.
//! - ValueObject and the concrete value objects (CardName, SetCode,
//!   ChannelName, SystemTag, UserId, DisplayName, BearerToken).
//! - Outcome, Failure: success/failure container for expected failures.
//! - Criteria, OrderBy: backend-neutral query description.
//! - EntityRepository: generic repository over a persistence backend.
//! - CacheManager: typed get-or-compute caching.
//! - IntegrationGateway, ExchangePayload: cross-system identity and messaging.
//! - CollectionItem, CollectionService: the card collection itself.
//! - Error, ErrorCode: unexpected faults and rejected requests.

pub mod value_object;

pub mod cache_manager;
pub mod collection;
pub mod collection_service;
pub mod criteria;
pub mod entity;
pub mod error;
pub mod events;
pub mod integration;
pub mod outcome;
pub mod ports;
pub mod repository;
pub mod trace_id;
pub mod user;

pub use self::cache_manager::CacheManager;
pub use self::collection::{
    CardCondition, CardName, CollectionItem, ITEM_ADDED, ITEM_REMOVED, ITEM_UPDATED, ItemChanges,
    Quantity, SetCode,
};
pub use self::collection_service::{CollectionService, ItemFilter, NewItem};
pub use self::criteria::{Criteria, Filterable, OrderBy, SortDirection};
pub use self::entity::{DomainEvent, Entity, EntityCore, EntityId};
pub use self::error::{Error, ErrorCode};
pub use self::events::{
    DOMAIN_EVENTS_CHANNEL, GatewayEventDispatcher, TracingEventDispatcher, publish_committed,
};
pub use self::integration::{
    ChannelName, ExchangePayload, ExchangePayloadBuilder, ExchangePayloadError,
    IntegrationGateway, MessageId, SystemTag,
};
pub use self::outcome::{FieldErrors, Failure, Metadata, Outcome, OutcomeStateError};
pub use self::repository::EntityRepository;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{AuthenticatedUser, BearerToken, DisplayName, UserId};
pub use self::value_object::{ValueObject, ValueObjectError};
