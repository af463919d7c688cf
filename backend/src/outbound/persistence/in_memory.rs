//! Process-local persistence backend for tests and database-less runs.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::ports::{PersistenceBackend, RepositoryError, StagedWrite, UnitOfWork};
use crate::domain::{Criteria, Entity, EntityId, Filterable, OrderBy};

/// [`PersistenceBackend`] over a [`DashMap`].
///
/// Filtering and ordering use [`Filterable`]. Flushes are serialised by a
/// mutex so each unit of work lands as a whole; readers may still observe a
/// flush half-applied.
pub struct InMemoryBackend<E: Entity> {
    rows: DashMap<EntityId, E>,
    flush_lock: Mutex<()>,
    flushes: AtomicUsize,
}

impl<E: Entity> Default for InMemoryBackend<E> {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
            flush_lock: Mutex::new(()),
            flushes: AtomicUsize::new(0),
        }
    }
}

impl<E: Entity> InMemoryBackend<E> {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty units flushed so far.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn window<T>(rows: Vec<T>, limit: Option<u64>, offset: Option<u64>) -> Vec<T> {
    let skip = offset
        .map_or(0, |value| usize::try_from(value).unwrap_or(usize::MAX));
    let take = limit.map_or(usize::MAX, |value| usize::try_from(value).unwrap_or(usize::MAX));
    rows.into_iter().skip(skip).take(take).collect()
}

#[async_trait]
impl<E> PersistenceBackend<E> for InMemoryBackend<E>
where
    E: Entity + Filterable,
{
    async fn find(&self, id: &EntityId) -> Result<Option<E>, RepositoryError> {
        Ok(self.rows.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by(
        &self,
        criteria: &Criteria,
        order_by: Option<&OrderBy>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<E>, RepositoryError> {
        let mut matches: Vec<E> = self
            .rows
            .iter()
            .filter(|entry| criteria.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        // DashMap iteration order is arbitrary; fall back to creation order.
        matches.sort_by(|a, b| {
            order_by
                .map_or(std::cmp::Ordering::Equal, |order| order.compare(a, b))
                .then_with(|| a.core().created_at().cmp(&b.core().created_at()))
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(window(matches, limit, offset))
    }

    async fn count(&self, criteria: &Criteria) -> Result<u64, RepositoryError> {
        let count = self
            .rows
            .iter()
            .filter(|entry| criteria.matches(entry.value()))
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn flush(&self, unit: UnitOfWork<E>) -> Result<(), RepositoryError> {
        if unit.is_empty() {
            return Ok(());
        }
        let _guard = self.flush_lock.lock().await;
        for write in unit.into_writes() {
            match write {
                StagedWrite::Persist(entity) => {
                    self.rows.insert(entity.id(), entity);
                }
                StagedWrite::Remove(id) => {
                    self.rows.remove(&id);
                }
            }
        }
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Filtering, ordering and unit-of-work application in memory.
    use super::*;
    use crate::domain::{CardCondition, CardName, CollectionItem, Quantity, SetCode};
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    fn item(name: &str, set: &str, quantity: i64) -> CollectionItem {
        CollectionItem::new(
            CardName::new(name).expect("name"),
            SetCode::new(set).expect("set"),
            Quantity::new(quantity).expect("quantity"),
            CardCondition::Good,
            &DefaultClock,
        )
    }

    #[fixture]
    fn backend() -> InMemoryBackend<CollectionItem> {
        InMemoryBackend::new()
    }

    async fn seed(backend: &InMemoryBackend<CollectionItem>, items: &[CollectionItem]) {
        let mut unit = UnitOfWork::new();
        for entry in items {
            unit.persist(entry);
        }
        backend.flush(unit).await.expect("flush");
    }

    #[rstest]
    #[tokio::test]
    async fn find_by_filters_sorts_and_windows(backend: InMemoryBackend<CollectionItem>) {
        seed(
            &backend,
            &[
                item("Counterspell", "LEA", 4),
                item("Ancestral Recall", "LEA", 1),
                item("Brainstorm", "ICE", 2),
                item("Braingeyser", "LEA", 1),
            ],
        )
        .await;
        let criteria = Criteria::new().with("set_code", "LEA");
        let order = OrderBy::asc("name");

        let page = backend
            .find_by(&criteria, Some(&order), Some(2), Some(1))
            .await
            .expect("find");
        let names: Vec<_> = page.iter().map(|i| i.name().to_string()).collect();

        assert_eq!(names, ["Braingeyser", "Counterspell"]);
        assert_eq!(backend.count(&criteria).await.expect("count"), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn a_unit_applies_writes_in_order(backend: InMemoryBackend<CollectionItem>) {
        let kept = item("Island", "LEA", 20);
        let dropped = item("Swamp", "LEA", 20);
        seed(&backend, &[kept.clone(), dropped.clone()]).await;

        let mut unit = UnitOfWork::new();
        unit.remove(&dropped);
        unit.persist(&dropped);
        unit.remove(&dropped);
        backend.flush(unit).await.expect("flush");

        assert_eq!(backend.len(), 1);
        assert!(backend.find(&kept.id()).await.expect("find").is_some());
        assert_eq!(backend.flush_count(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_units_do_not_count(backend: InMemoryBackend<CollectionItem>) {
        backend.flush(UnitOfWork::new()).await.expect("flush");
        assert_eq!(backend.flush_count(), 0);
        assert!(backend.is_empty());
    }
}
