//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL via Diesel, plus an in-memory backend.
//! - **cache**: Redis and in-memory [`CacheStore`](crate::domain::ports::CacheStore)s.
//! - **queue**: Redis list, in-memory and stub queue bridges.
//! - **auth**: static API token registry.
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod auth;
pub mod cache;
pub mod persistence;
pub mod queue;
pub mod redis;
