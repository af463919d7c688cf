//! Identity, timestamps and domain-event buffering shared by all entities.
//!
//! Concrete entities embed an [`EntityCore`] and implement [`Entity`] to
//! expose it. The core owns the identifier, the creation and update stamps,
//! and the buffer of events raised since the last unit of work was committed.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Opaque entity identifier wrapping a UUID v4.
///
/// New entities always receive a freshly generated identifier; only
/// persistence adapters rebuild identifiers from stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Rebuild an identifier from a stored UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Borrow the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Immutable record of something that happened to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    name: String,
    occurred_at: DateTime<Utc>,
    entity_id: EntityId,
    payload: Map<String, Value>,
}

impl DomainEvent {
    /// Record an event raised by `entity_id` at `occurred_at`.
    pub fn new(
        name: impl Into<String>,
        entity_id: EntityId,
        occurred_at: DateTime<Utc>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            name: name.into(),
            occurred_at,
            entity_id,
            payload,
        }
    }

    /// Dotted event name such as `collection_item.added`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the event was raised.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Entity that raised the event.
    #[must_use]
    pub const fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Event-specific attributes.
    #[must_use]
    pub const fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

/// State common to every entity.
#[derive(Debug, Clone)]
pub struct EntityCore {
    id: EntityId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl EntityCore {
    /// Start a brand-new entity with a generated identifier.
    pub fn new(clock: &dyn Clock) -> Self {
        let now = clock.utc();
        Self {
            id: EntityId::generate(),
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        }
    }

    /// Rehydrate a stored entity. The event buffer starts empty.
    #[must_use]
    pub const fn restore(id: EntityId, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            updated_at,
            events: Vec::new(),
        }
    }

    /// Entity identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Stamp the update timestamp with the current time.
    pub fn mark_as_updated(&mut self, clock: &dyn Clock) {
        self.updated_at = clock.utc();
    }

    /// Append an event to the pending buffer.
    pub fn record_event(
        &mut self,
        name: impl Into<String>,
        payload: Map<String, Value>,
        clock: &dyn Clock,
    ) {
        let event = DomainEvent::new(name, self.id, clock.utc(), payload);
        self.events.push(event);
    }

    /// Events raised since the last drain.
    #[must_use]
    pub fn pending_events(&self) -> &[DomainEvent] {
        &self.events
    }

    /// Take every pending event, leaving the buffer empty.
    pub fn pull_domain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Behaviour shared by every entity.
///
/// Equality between entities of one concrete type is identity equality:
/// implementors route `PartialEq` through [`Entity::same_identity`].
pub trait Entity: Clone + Send + Sync + 'static {
    /// Short name used in logs and error messages.
    const KIND: &'static str;

    /// Shared entity state.
    fn core(&self) -> &EntityCore;

    /// Mutable shared entity state.
    fn core_mut(&mut self) -> &mut EntityCore;

    /// Entity identifier.
    fn id(&self) -> EntityId {
        self.core().id()
    }

    /// Stamp the update timestamp with the current time.
    fn mark_as_updated(&mut self, clock: &dyn Clock) {
        self.core_mut().mark_as_updated(clock);
    }

    /// Take every pending event, leaving the buffer empty.
    fn pull_domain_events(&mut self) -> Vec<DomainEvent> {
        self.core_mut().pull_domain_events()
    }

    /// Whether `other` carries the same identifier.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

#[cfg(test)]
mod tests {
    //! Identity, stamping and event buffer behaviour.
    use super::*;
    use chrono::TimeZone;
    use mockable::MockClock;
    use rstest::{fixture, rstest};

    #[derive(Debug, Clone)]
    struct Widget {
        core: EntityCore,
        label: String,
    }

    impl Entity for Widget {
        const KIND: &'static str = "widget";

        fn core(&self) -> &EntityCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut EntityCore {
            &mut self.core
        }
    }

    impl PartialEq for Widget {
        fn eq(&self, other: &Self) -> bool {
            self.same_identity(other)
        }
    }

    fn clock_at(seconds: i64) -> MockClock {
        let mut clock = MockClock::new();
        let instant = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .expect("valid timestamp");
        clock.expect_utc().return_const(instant);
        clock
    }

    #[fixture]
    fn widget() -> Widget {
        Widget {
            core: EntityCore::new(&clock_at(1_000)),
            label: "first".to_owned(),
        }
    }

    #[rstest]
    fn equality_is_reflexive(widget: Widget) {
        assert_eq!(widget, widget.clone());
    }

    #[rstest]
    fn fresh_entities_are_distinct() {
        let clock = clock_at(0);
        let a = Widget {
            core: EntityCore::new(&clock),
            label: "same".to_owned(),
        };
        let b = Widget {
            core: EntityCore::new(&clock),
            label: "same".to_owned(),
        };
        assert_ne!(a, b);
    }

    #[rstest]
    fn same_id_is_equal_despite_other_fields(widget: Widget) {
        let mut other = widget.clone();
        other.label = "changed".to_owned();
        assert_eq!(widget, other);
    }

    #[rstest]
    fn restored_entities_keep_identity(widget: Widget) {
        let core = EntityCore::restore(
            widget.id(),
            widget.core.created_at(),
            widget.core.updated_at(),
        );
        let restored = Widget {
            core,
            label: "stored".to_owned(),
        };
        assert_eq!(widget, restored);
    }

    #[rstest]
    fn mark_as_updated_only_moves_update_stamp(mut widget: Widget) {
        let created = widget.core.created_at();
        widget.mark_as_updated(&clock_at(2_000));
        assert_eq!(widget.core.created_at(), created);
        assert_eq!(widget.core.updated_at().timestamp(), 2_000);
    }

    #[rstest]
    fn pulling_events_drains_the_buffer(mut widget: Widget) {
        let clock = clock_at(1_500);
        widget.core.record_event("widget.created", Map::new(), &clock);
        widget.core.record_event("widget.renamed", Map::new(), &clock);

        let first = widget.pull_domain_events();
        let names: Vec<_> = first.iter().map(DomainEvent::name).collect();
        assert_eq!(names, ["widget.created", "widget.renamed"]);
        assert!(first.iter().all(|event| event.entity_id() == widget.id()));

        assert!(widget.pull_domain_events().is_empty());
    }

    #[rstest]
    fn entity_ids_round_trip_through_strings() {
        let id = EntityId::generate();
        let parsed: EntityId = id.to_string().parse().expect("parse id");
        assert_eq!(parsed, id);
    }
}
