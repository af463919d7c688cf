//! Generic [`Repository`] over a pluggable persistence backend.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use super::events::publish_committed;
use super::ports::{
    DomainEventDispatcher, PersistenceBackend, Repository, RepositoryError, UnitOfWork,
};
use super::{Criteria, DomainEvent, Entity, EntityId, OrderBy};

/// Repository implementation shared by every entity type.
///
/// Each write call builds its own [`UnitOfWork`] and flushes it once, so
/// concurrent requests never share staged state. Domain events are drained
/// only after the flush succeeds; a failed flush leaves them pending on the
/// entities.
pub struct EntityRepository<E: Entity> {
    backend: Arc<dyn PersistenceBackend<E>>,
    clock: Arc<dyn Clock>,
    dispatcher: Arc<dyn DomainEventDispatcher>,
}

impl<E: Entity> Clone for EntityRepository<E> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            clock: Arc::clone(&self.clock),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<E: Entity> EntityRepository<E> {
    /// Compose a repository.
    pub fn new(
        backend: Arc<dyn PersistenceBackend<E>>,
        clock: Arc<dyn Clock>,
        dispatcher: Arc<dyn DomainEventDispatcher>,
    ) -> Self {
        Self {
            backend,
            clock,
            dispatcher,
        }
    }

    async fn commit(
        &self,
        unit: UnitOfWork<E>,
        entities: &mut [E],
    ) -> Result<(), RepositoryError> {
        if unit.is_empty() {
            return Ok(());
        }
        let staged = unit.len();
        self.backend.flush(unit).await?;
        debug!(kind = E::KIND, staged, "unit of work committed");

        let events: Vec<DomainEvent> = entities
            .iter_mut()
            .flat_map(|entity| entity.pull_domain_events())
            .collect();
        publish_committed(self.dispatcher.as_ref(), events).await;
        Ok(())
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for EntityRepository<E> {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<E>, RepositoryError> {
        self.backend.find(id).await
    }

    async fn find_all(&self) -> Result<Vec<E>, RepositoryError> {
        self.backend.find_by(&Criteria::new(), None, None, None).await
    }

    async fn find_by(
        &self,
        criteria: &Criteria,
        order_by: Option<&OrderBy>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<E>, RepositoryError> {
        self.backend.find_by(criteria, order_by, limit, offset).await
    }

    async fn find_one_by(&self, criteria: &Criteria) -> Result<Option<E>, RepositoryError> {
        let mut found = self.backend.find_by(criteria, None, Some(1), None).await?;
        Ok(found.pop())
    }

    async fn save(&self, entity: &mut E) -> Result<(), RepositoryError> {
        self.save_all(std::slice::from_mut(entity)).await
    }

    async fn remove(&self, entity: &mut E) -> Result<(), RepositoryError> {
        self.remove_all(std::slice::from_mut(entity)).await
    }

    async fn count(&self, criteria: &Criteria) -> Result<u64, RepositoryError> {
        self.backend.count(criteria).await
    }

    async fn save_all(&self, entities: &mut [E]) -> Result<(), RepositoryError> {
        let mut unit = UnitOfWork::new();
        for entity in entities.iter_mut() {
            entity.mark_as_updated(self.clock.as_ref());
            unit.persist(entity);
        }
        self.commit(unit, entities).await
    }

    async fn remove_all(&self, entities: &mut [E]) -> Result<(), RepositoryError> {
        let mut unit = UnitOfWork::new();
        for entity in entities.iter() {
            unit.remove(entity);
        }
        self.commit(unit, entities).await
    }
}

#[cfg(test)]
mod tests {
    //! Unit-of-work staging, flush counting and event hand-off.
    use std::sync::Mutex;

    use super::*;
    use crate::domain::ports::{EventDispatchError, MockDomainEventDispatcher, StagedWrite};
    use crate::domain::{EntityCore, Filterable};
    use chrono::{TimeZone, Utc};
    use mockable::MockClock;
    use pagination::Pagination;
    use rstest::{fixture, rstest};
    use serde_json::{Map, Value, json};

    #[derive(Debug, Clone)]
    struct Note {
        core: EntityCore,
        body: String,
    }

    impl Entity for Note {
        const KIND: &'static str = "note";

        fn core(&self) -> &EntityCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut EntityCore {
            &mut self.core
        }
    }

    impl Filterable for Note {
        fn field_value(&self, field: &str) -> Option<Value> {
            (field == "body").then(|| json!(self.body))
        }
    }

    /// Records flushed units and serves reads from what was flushed.
    #[derive(Default)]
    struct RecordingBackend {
        rows: Mutex<Vec<Note>>,
        flushes: Mutex<Vec<usize>>,
        fail_flush: bool,
    }

    #[async_trait]
    impl PersistenceBackend<Note> for RecordingBackend {
        async fn find(&self, id: &EntityId) -> Result<Option<Note>, RepositoryError> {
            let rows = self.rows.lock().expect("rows lock");
            Ok(rows.iter().find(|note| note.id() == *id).cloned())
        }

        async fn find_by(
            &self,
            criteria: &Criteria,
            _order_by: Option<&OrderBy>,
            limit: Option<u64>,
            offset: Option<u64>,
        ) -> Result<Vec<Note>, RepositoryError> {
            let rows = self.rows.lock().expect("rows lock");
            let skip = usize::try_from(offset.unwrap_or(0)).expect("offset fits");
            let take = limit.map_or(usize::MAX, |n| usize::try_from(n).expect("limit fits"));
            Ok(rows
                .iter()
                .filter(|note| criteria.matches(*note))
                .skip(skip)
                .take(take)
                .cloned()
                .collect())
        }

        async fn count(&self, criteria: &Criteria) -> Result<u64, RepositoryError> {
            let rows = self.rows.lock().expect("rows lock");
            Ok(rows.iter().filter(|note| criteria.matches(*note)).count() as u64)
        }

        async fn flush(&self, unit: UnitOfWork<Note>) -> Result<(), RepositoryError> {
            if self.fail_flush {
                return Err(RepositoryError::connection("database offline"));
            }
            self.flushes.lock().expect("flush lock").push(unit.len());
            let mut rows = self.rows.lock().expect("rows lock");
            for write in unit.into_writes() {
                match write {
                    StagedWrite::Persist(note) => {
                        rows.retain(|row| row.id() != note.id());
                        rows.push(note);
                    }
                    StagedWrite::Remove(id) => rows.retain(|row| row.id() != id),
                }
            }
            Ok(())
        }
    }

    fn clock_at(seconds: i64) -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        let at = Utc.timestamp_opt(seconds, 0).single().expect("valid time");
        clock.expect_utc().return_const(at);
        Arc::new(clock)
    }

    fn note(body: &str) -> Note {
        let clock = clock_at(0);
        let mut core = EntityCore::new(clock.as_ref());
        core.record_event("note.written", Map::new(), clock.as_ref());
        Note {
            core,
            body: body.to_owned(),
        }
    }

    fn silent_dispatcher() -> Arc<dyn DomainEventDispatcher> {
        let mut dispatcher = MockDomainEventDispatcher::new();
        dispatcher.expect_dispatch().returning(|_| Ok(()));
        Arc::new(dispatcher)
    }

    #[fixture]
    fn backend() -> Arc<RecordingBackend> {
        Arc::new(RecordingBackend::default())
    }

    fn repository(
        backend: &Arc<RecordingBackend>,
        dispatcher: Arc<dyn DomainEventDispatcher>,
    ) -> EntityRepository<Note> {
        let backend: Arc<dyn PersistenceBackend<Note>> = Arc::clone(backend) as _;
        EntityRepository::new(backend, clock_at(500), dispatcher)
    }

    #[rstest]
    #[tokio::test]
    async fn save_stamps_and_flushes_once(backend: Arc<RecordingBackend>) {
        let repo = repository(&backend, silent_dispatcher());
        let mut first = note("first");

        repo.save(&mut first).await.expect("save");

        assert_eq!(first.core().updated_at().timestamp(), 500);
        assert_eq!(*backend.flushes.lock().expect("lock"), vec![1]);
        let found = repo.find_by_id(&first.id()).await.expect("find");
        assert_eq!(found.map(|n| n.body), Some("first".to_owned()));
    }

    #[rstest]
    #[tokio::test]
    async fn save_all_commits_a_single_unit(backend: Arc<RecordingBackend>) {
        let repo = repository(&backend, silent_dispatcher());
        let mut notes = vec![note("a"), note("b"), note("c")];

        repo.save_all(&mut notes).await.expect("save all");

        assert_eq!(*backend.flushes.lock().expect("lock"), vec![3]);
        assert_eq!(repo.count(&Criteria::new()).await.expect("count"), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn events_are_drained_once_after_commit(backend: Arc<RecordingBackend>) {
        let mut dispatcher = MockDomainEventDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(|events| events.len() == 2)
            .times(1)
            .returning(|_| Ok(()));
        let repo = repository(&backend, Arc::new(dispatcher));
        let mut notes = vec![note("a"), note("b")];

        repo.save_all(&mut notes).await.expect("save all");

        assert!(notes.iter_mut().all(|n| n.pull_domain_events().is_empty()));
    }

    #[rstest]
    #[tokio::test]
    async fn dispatch_failures_do_not_fail_the_write(backend: Arc<RecordingBackend>) {
        let mut dispatcher = MockDomainEventDispatcher::new();
        dispatcher
            .expect_dispatch()
            .returning(|events| Err(EventDispatchError::undelivered(events.len())));
        let repo = repository(&backend, Arc::new(dispatcher));
        let mut first = note("first");

        assert!(repo.save(&mut first).await.is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn failed_flush_keeps_events_pending() {
        let backend = Arc::new(RecordingBackend {
            fail_flush: true,
            ..RecordingBackend::default()
        });
        let repo = repository(&backend, Arc::new(MockDomainEventDispatcher::new()));
        let mut first = note("first");

        let err = repo.save(&mut first).await.expect_err("flush fails");
        assert!(matches!(err, RepositoryError::Connection { .. }));
        assert_eq!(first.pull_domain_events().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn lookups_of_missing_entities_are_none(backend: Arc<RecordingBackend>) {
        let repo = repository(&backend, silent_dispatcher());
        let criteria = Criteria::new().with("body", "absent");

        assert!(repo.find_by_id(&EntityId::generate()).await.expect("find").is_none());
        assert!(repo.find_one_by(&criteria).await.expect("find").is_none());
        assert!(!repo.exists(&criteria).await.expect("exists"));
    }

    #[rstest]
    #[tokio::test]
    async fn remove_all_deletes_every_entity(backend: Arc<RecordingBackend>) {
        let repo = repository(&backend, silent_dispatcher());
        let mut notes = vec![note("a"), note("b")];
        repo.save_all(&mut notes).await.expect("save all");

        repo.remove_all(&mut notes).await.expect("remove all");

        assert_eq!(repo.count(&Criteria::new()).await.expect("count"), 0);
        assert_eq!(*backend.flushes.lock().expect("lock"), vec![2, 2]);
    }

    #[rstest]
    #[tokio::test]
    async fn paginate_reports_totals(backend: Arc<RecordingBackend>) {
        let repo = repository(&backend, silent_dispatcher());
        let mut notes: Vec<_> = (0..12).map(|i| note(&format!("n{i}"))).collect();
        repo.save_all(&mut notes).await.expect("save all");

        let page = repo
            .paginate(&Criteria::new(), None, Pagination::new(3, 5))
            .await
            .expect("paginate");

        assert_eq!(page.items().len(), 2);
        assert_eq!(page.total(), 12);
        assert!(!page.has_next_page());
    }
}
