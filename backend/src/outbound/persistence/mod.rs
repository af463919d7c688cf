//! Persistence backends for the repository layer.
//!
//! - [`InMemoryBackend`]: DashMap-backed, for tests and database-less runs.
//! - [`DieselCollectionBackend`]: PostgreSQL through `diesel-async` and a
//!   `bb8` pool. Row structs and the schema stay private to this module.
//!
//! ```ignore
//! let pool = DbPool::new(PoolConfig::new(url)).await?;
//! run_pending_migrations(url).await?;
//! let backend = DieselCollectionBackend::new(pool);
//! ```

mod diesel_collection_backend;
mod error_mapping;
mod in_memory;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_collection_backend::DieselCollectionBackend;
pub use in_memory::InMemoryBackend;
pub use migrations::run_pending_migrations;
pub use pool::{DbPool, PoolConfig, PoolError};
