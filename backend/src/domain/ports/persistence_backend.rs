//! Driven port for the storage engine behind [`super::Repository`].
//!
//! Reads go straight to the backend. Writes are collected in a
//! [`UnitOfWork`] and committed together by [`PersistenceBackend::flush`],
//! so a batch of saves costs one round-trip and lands atomically where the
//! backend supports transactions.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{Criteria, Entity, EntityId, OrderBy};

/// Write staged in a unit of work.
#[derive(Debug, Clone)]
pub enum StagedWrite<E> {
    /// Insert or replace the entity.
    Persist(E),
    /// Delete the entity with this identifier.
    Remove(EntityId),
}

/// Ordered set of writes committed by one flush.
#[derive(Debug, Clone)]
pub struct UnitOfWork<E> {
    writes: Vec<StagedWrite<E>>,
}

impl<E> Default for UnitOfWork<E> {
    fn default() -> Self {
        Self { writes: Vec::new() }
    }
}

impl<E: Entity> UnitOfWork<E> {
    /// Empty unit of work.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an insert-or-replace of `entity`'s current state.
    pub fn persist(&mut self, entity: &E) {
        self.writes.push(StagedWrite::Persist(entity.clone()));
    }

    /// Stage removal of `entity`.
    pub fn remove(&mut self, entity: &E) {
        self.writes.push(StagedWrite::Remove(entity.id()));
    }

    /// Whether nothing has been staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Number of staged writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Staged writes in staging order.
    #[must_use]
    pub fn into_writes(self) -> Vec<StagedWrite<E>> {
        self.writes
    }
}

/// Storage engine for one entity type.
#[async_trait]
pub trait PersistenceBackend<E: Entity>: Send + Sync {
    /// Load one entity by identifier.
    async fn find(&self, id: &EntityId) -> Result<Option<E>, RepositoryError>;

    /// Load matching entities in the requested order and window.
    async fn find_by(
        &self,
        criteria: &Criteria,
        order_by: Option<&OrderBy>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<E>, RepositoryError>;

    /// Count matching entities.
    async fn count(&self, criteria: &Criteria) -> Result<u64, RepositoryError>;

    /// Commit every staged write, all or nothing.
    async fn flush(&self, unit: UnitOfWork<E>) -> Result<(), RepositoryError>;
}
