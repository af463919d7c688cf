//! Driven port for entity persistence with unit-of-work commits.
use async_trait::async_trait;
use pagination::{PaginatedResult, Pagination};

use super::define_port_error;
use crate::domain::{Criteria, Entity, EntityId, OrderBy};

define_port_error! {
    /// Errors raised by repositories and persistence backends.
    pub enum RepositoryError {
        /// Connection could not be established or was lost.
        Connection { message: String } => "repository connection failed: {message}",
        /// Query failed during execution or a row could not be decoded.
        Query { message: String } => "repository query failed: {message}",
        /// Filter or sort refers to a field the backend cannot handle.
        UnsupportedField { field: String } => "repository cannot filter or sort on `{field}`",
    }
}

impl From<RepositoryError> for crate::domain::Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Connection { .. } | RepositoryError::Query { .. } => {
                Self::internal(err.to_string())
            }
            RepositoryError::UnsupportedField { .. } => Self::invalid_request(err.to_string()),
        }
    }
}

/// CRUD access to one entity type.
///
/// Writes stamp `mark_as_updated`, commit once per call and hand the drained
/// domain events of the written entities to the configured dispatcher.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Load one entity; `Ok(None)` when it does not exist.
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<E>, RepositoryError>;

    /// Load every entity.
    async fn find_all(&self) -> Result<Vec<E>, RepositoryError>;

    /// Load entities matching `criteria`.
    async fn find_by(
        &self,
        criteria: &Criteria,
        order_by: Option<&OrderBy>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<E>, RepositoryError>;

    /// First entity matching `criteria`; `Ok(None)` when nothing matches.
    async fn find_one_by(&self, criteria: &Criteria) -> Result<Option<E>, RepositoryError>;

    /// Stamp, stage and commit one entity.
    async fn save(&self, entity: &mut E) -> Result<(), RepositoryError>;

    /// Stage and commit removal of one entity.
    async fn remove(&self, entity: &mut E) -> Result<(), RepositoryError>;

    /// Number of entities matching `criteria`.
    async fn count(&self, criteria: &Criteria) -> Result<u64, RepositoryError>;

    /// Whether any entity matches `criteria`; always `count(criteria) > 0`.
    async fn exists(&self, criteria: &Criteria) -> Result<bool, RepositoryError> {
        Ok(self.count(criteria).await? > 0)
    }

    /// Stamp and stage every entity, then commit once.
    async fn save_all(&self, entities: &mut [E]) -> Result<(), RepositoryError>;

    /// Stage removal of every entity, then commit once.
    async fn remove_all(&self, entities: &mut [E]) -> Result<(), RepositoryError>;

    /// One page of entities matching `criteria`, with the total match count.
    async fn paginate(
        &self,
        criteria: &Criteria,
        order_by: Option<&OrderBy>,
        window: Pagination,
    ) -> Result<PaginatedResult<E>, RepositoryError> {
        let total = self.count(criteria).await?;
        let items = self
            .find_by(
                criteria,
                order_by,
                Some(u64::from(window.per_page())),
                Some(window.offset()),
            )
            .await?;
        Ok(PaginatedResult::new(items, total, window))
    }
}
