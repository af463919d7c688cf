//! Cards held in a collection.

use std::fmt;
use std::str::FromStr;

use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::ToSchema;

use super::value_object::{
    ValueObject, ValueObjectError, require_max_chars, require_trimmed, value_object,
};
use super::{Entity, EntityCore, Filterable};

const CARD_NAME_MAX: usize = 150;
const SET_CODE_MIN: usize = 2;
const SET_CODE_MAX: usize = 8;

/// Event raised when an item enters the collection.
pub const ITEM_ADDED: &str = "collection_item.added";
/// Event raised when quantity or condition changes.
pub const ITEM_UPDATED: &str = "collection_item.updated";
/// Event raised when an item leaves the collection.
pub const ITEM_REMOVED: &str = "collection_item.removed";

value_object! {
    /// Printed card name, e.g. `Black Lotus`.
    pub struct CardName;
}

impl ValueObject for CardName {
    const KIND: &'static str = "card name";

    fn validate(raw: &str) -> Result<(), ValueObjectError> {
        require_trimmed(Self::KIND, raw)?;
        require_max_chars(Self::KIND, raw, CARD_NAME_MAX)
    }
}

value_object! {
    /// Upper-case set code, e.g. `LEA`.
    pub struct SetCode;
}

impl ValueObject for SetCode {
    const KIND: &'static str = "set code";

    fn validate(raw: &str) -> Result<(), ValueObjectError> {
        require_trimmed(Self::KIND, raw)?;
        require_max_chars(Self::KIND, raw, SET_CODE_MAX)?;
        if raw.chars().count() < SET_CODE_MIN {
            return Err(ValueObjectError::Invalid {
                kind: Self::KIND,
                reason: "must be at least two characters",
            });
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(ValueObjectError::Invalid {
                kind: Self::KIND,
                reason: "may only contain upper-case letters and digits",
            });
        }
        Ok(())
    }
}

/// Number of copies held, between 1 and 9999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Smallest accepted quantity.
    pub const MIN: u32 = 1;
    /// Largest accepted quantity.
    pub const MAX: u32 = 9_999;

    /// Validate a raw count.
    ///
    /// # Errors
    /// Returns [`ValueObjectError::Invalid`] outside `MIN..=MAX`.
    pub fn new(value: i64) -> Result<Self, ValueObjectError> {
        u32::try_from(value)
            .ok()
            .filter(|count| (Self::MIN..=Self::MAX).contains(count))
            .map(Self)
            .ok_or(ValueObjectError::Invalid {
                kind: "quantity",
                reason: "must be between 1 and 9999",
            })
    }

    /// Raw count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Physical grading of a card.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CardCondition {
    /// Untouched.
    Mint,
    /// Minimal wear; the default grade.
    #[default]
    NearMint,
    /// Light wear.
    Excellent,
    /// Visible wear.
    Good,
    /// Heavy wear.
    Played,
    /// Damaged.
    Poor,
}

impl CardCondition {
    /// Every grade, best first.
    pub const ALL: [Self; 6] = [
        Self::Mint,
        Self::NearMint,
        Self::Excellent,
        Self::Good,
        Self::Played,
        Self::Poor,
    ];

    /// Wire and storage spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::NearMint => "near_mint",
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Played => "played",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for CardCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardCondition {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|condition| condition.as_str() == s)
            .ok_or(ValueObjectError::Invalid {
                kind: "card condition",
                reason: "must be one of mint, near_mint, excellent, good, played, poor",
            })
    }
}

/// Requested changes to an existing item; `None` leaves a field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemChanges {
    /// New quantity.
    pub quantity: Option<Quantity>,
    /// New condition.
    pub condition: Option<CardCondition>,
}

impl ItemChanges {
    /// Whether no change was requested.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.condition.is_none()
    }
}

/// One card entry in the collection.
///
/// Equality is identity equality, see [`Entity`].
#[derive(Debug, Clone)]
pub struct CollectionItem {
    core: EntityCore,
    name: CardName,
    set_code: SetCode,
    quantity: Quantity,
    condition: CardCondition,
}

impl CollectionItem {
    /// Add a new card, raising [`ITEM_ADDED`].
    pub fn new(
        name: CardName,
        set_code: SetCode,
        quantity: Quantity,
        condition: CardCondition,
        clock: &dyn Clock,
    ) -> Self {
        let mut item = Self {
            core: EntityCore::new(clock),
            name,
            set_code,
            quantity,
            condition,
        };
        let payload = item.snapshot();
        item.core.record_event(ITEM_ADDED, payload, clock);
        item
    }

    /// Rehydrate a stored item without raising events.
    #[must_use]
    pub const fn restore(
        core: EntityCore,
        name: CardName,
        set_code: SetCode,
        quantity: Quantity,
        condition: CardCondition,
    ) -> Self {
        Self {
            core,
            name,
            set_code,
            quantity,
            condition,
        }
    }

    /// Card name.
    #[must_use]
    pub const fn name(&self) -> &CardName {
        &self.name
    }

    /// Set code.
    #[must_use]
    pub const fn set_code(&self) -> &SetCode {
        &self.set_code
    }

    /// Copies held.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Grade.
    #[must_use]
    pub const fn condition(&self) -> CardCondition {
        self.condition
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.core.created_at()
    }

    /// Last update time.
    #[must_use]
    pub const fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.core.updated_at()
    }

    /// Apply `changes`; raises [`ITEM_UPDATED`] listing the fields that
    /// actually changed. Returns `false` when nothing changed.
    pub fn apply(&mut self, changes: ItemChanges, clock: &dyn Clock) -> bool {
        let mut changed = Map::new();
        if let Some(quantity) = changes.quantity.filter(|q| *q != self.quantity) {
            self.quantity = quantity;
            changed.insert("quantity".to_owned(), json!(quantity.get()));
        }
        if let Some(condition) = changes.condition.filter(|c| *c != self.condition) {
            self.condition = condition;
            changed.insert("condition".to_owned(), json!(condition.as_str()));
        }
        if changed.is_empty() {
            return false;
        }
        self.core.record_event(ITEM_UPDATED, changed, clock);
        true
    }

    /// Raise [`ITEM_REMOVED`]; the repository performs the deletion.
    pub fn mark_removed(&mut self, clock: &dyn Clock) {
        let payload = self.snapshot();
        self.core.record_event(ITEM_REMOVED, payload, clock);
    }

    fn snapshot(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("name".to_owned(), json!(self.name.as_str()));
        payload.insert("setCode".to_owned(), json!(self.set_code.as_str()));
        payload.insert("quantity".to_owned(), json!(self.quantity.get()));
        payload.insert("condition".to_owned(), json!(self.condition.as_str()));
        payload
    }
}

impl Entity for CollectionItem {
    const KIND: &'static str = "collection item";

    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }
}

impl PartialEq for CollectionItem {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for CollectionItem {}

impl Filterable for CollectionItem {
    fn field_value(&self, field: &str) -> Option<Value> {
        let value = match field {
            "id" => json!(self.core.id().to_string()),
            "name" => json!(self.name.as_str()),
            "set_code" => json!(self.set_code.as_str()),
            "quantity" => json!(self.quantity.get()),
            "condition" => json!(self.condition.as_str()),
            "created_at" => json!(self.core.created_at().timestamp_micros()),
            "updated_at" => json!(self.core.updated_at().timestamp_micros()),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    //! Collection item invariants and events.
    use super::*;
    use crate::domain::DomainEvent;
    use chrono::{TimeZone, Utc};
    use mockable::MockClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn clock() -> MockClock {
        let mut clock = MockClock::new();
        let at = Utc
            .with_ymd_and_hms(2026, 2, 14, 8, 0, 0)
            .single()
            .expect("valid time");
        clock.expect_utc().return_const(at);
        clock
    }

    #[fixture]
    fn lotus(clock: MockClock) -> CollectionItem {
        CollectionItem::new(
            CardName::new("Black Lotus").expect("name"),
            SetCode::new("LEA").expect("set"),
            Quantity::new(1).expect("quantity"),
            CardCondition::NearMint,
            &clock,
        )
    }

    #[rstest]
    #[case("LEA", true)]
    #[case("M21", true)]
    #[case("lea", false)]
    #[case("L", false)]
    #[case("TOOLONGSET", false)]
    fn set_codes_are_upper_case(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(SetCode::new(raw).is_ok(), ok);
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(9_999, true)]
    #[case(10_000, false)]
    #[case(-3, false)]
    fn quantities_are_bounded(#[case] raw: i64, #[case] ok: bool) {
        assert_eq!(Quantity::new(raw).is_ok(), ok);
    }

    #[rstest]
    fn conditions_round_trip_through_their_spelling() {
        for condition in CardCondition::ALL {
            assert_eq!(condition.as_str().parse::<CardCondition>(), Ok(condition));
        }
        assert!("pristine".parse::<CardCondition>().is_err());
    }

    #[rstest]
    fn new_items_raise_added(mut lotus: CollectionItem) {
        let events = lotus.pull_domain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), ITEM_ADDED);
        assert_eq!(events[0].payload()["setCode"], json!("LEA"));
    }

    #[rstest]
    fn apply_records_only_real_changes(mut lotus: CollectionItem, clock: MockClock) {
        lotus.pull_domain_events();
        let unchanged = ItemChanges {
            quantity: Some(Quantity::new(1).expect("quantity")),
            condition: None,
        };
        assert!(!lotus.apply(unchanged, &clock));
        assert!(lotus.pull_domain_events().is_empty());

        let changes = ItemChanges {
            quantity: Some(Quantity::new(4).expect("quantity")),
            condition: Some(CardCondition::Played),
        };
        assert!(lotus.apply(changes, &clock));
        let events = lotus.pull_domain_events();
        let names: Vec<_> = events.iter().map(DomainEvent::name).collect();
        assert_eq!(names, [ITEM_UPDATED]);
        assert_eq!(
            events[0].payload(),
            json!({"quantity": 4, "condition": "played"})
                .as_object()
                .expect("object")
        );
    }

    #[rstest]
    fn fields_are_filterable(lotus: CollectionItem) {
        assert_eq!(lotus.field_value("set_code"), Some(json!("LEA")));
        assert_eq!(lotus.field_value("condition"), Some(json!("near_mint")));
        assert_eq!(lotus.field_value("colour"), None);
    }
}
