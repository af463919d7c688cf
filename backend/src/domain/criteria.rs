//! Equality filters and sort orders understood by every persistence backend.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Exposes entity attributes by name so in-process backends can filter and
/// sort without reflection.
pub trait Filterable {
    /// JSON value of `field`, or `None` when the entity has no such field.
    fn field_value(&self, field: &str) -> Option<Value>;
}

/// Conjunction of `field == value` filters.
///
/// A `null` value matches entities whose field is null or absent.
///
/// # Examples
/// ```
/// use card_tracker::domain::Criteria;
/// use serde_json::json;
///
/// let criteria = Criteria::new().with("set_code", "LEA").with("condition", "mint");
/// assert_eq!(criteria.get("set_code"), Some(&json!("LEA")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criteria(BTreeMap<String, Value>);

impl Criteria {
    /// Criteria matching everything.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add a filter, replacing any earlier filter on the same field.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Add a filter in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Filter value for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Whether no filters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Filters in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(field, value)| (field.as_str(), value))
    }

    /// Whether `entity` satisfies every filter.
    pub fn matches<E: Filterable + ?Sized>(&self, entity: &E) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| match entity.field_value(field) {
                Some(actual) => &actual == expected,
                None => expected.is_null(),
            })
    }
}

/// Sort direction for one ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// Ordered list of sort keys, applied left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderBy(Vec<(String, SortDirection)>);

impl OrderBy {
    /// Single ascending key.
    pub fn asc(field: impl Into<String>) -> Self {
        Self(vec![(field.into(), SortDirection::Asc)])
    }

    /// Single descending key.
    pub fn desc(field: impl Into<String>) -> Self {
        Self(vec![(field.into(), SortDirection::Desc)])
    }

    /// Append a tie-breaking key.
    #[must_use]
    pub fn then(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.0.push((field.into(), direction));
        self
    }

    /// Keys in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.0
            .iter()
            .map(|(field, direction)| (field.as_str(), *direction))
    }

    /// Compare two entities under this ordering.
    pub fn compare<E: Filterable + ?Sized>(&self, left: &E, right: &E) -> Ordering {
        for (field, direction) in self.iter() {
            let ordering = compare_values(
                left.field_value(field).as_ref(),
                right.field_value(field).as_ref(),
            );
            let ordering = match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Total order over JSON scalars: missing and null sort first, then booleans,
/// numbers and strings. Arrays and objects compare equal.
fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_) | Value::Object(_)) => 4,
        }
    }

    match (left, right) {
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        _ => rank(left).cmp(&rank(right)),
    }
}

#[cfg(test)]
mod tests {
    //! Filtering and ordering over a simple attribute bag.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    struct Row(BTreeMap<&'static str, Value>);

    impl Filterable for Row {
        fn field_value(&self, field: &str) -> Option<Value> {
            self.0.get(field).cloned()
        }
    }

    fn row(name: &str, qty: i64) -> Row {
        Row(BTreeMap::from([("name", json!(name)), ("qty", json!(qty))]))
    }

    #[rstest]
    fn empty_criteria_match_everything() {
        assert!(Criteria::new().matches(&row("Mox", 1)));
    }

    #[rstest]
    #[case(Criteria::new().with("name", "Mox"), true)]
    #[case(Criteria::new().with("name", "Mox").with("qty", 2), false)]
    #[case(Criteria::new().with("missing", Value::Null), true)]
    #[case(Criteria::new().with("missing", "x"), false)]
    fn criteria_require_every_filter(#[case] criteria: Criteria, #[case] expected: bool) {
        assert_eq!(criteria.matches(&row("Mox", 1)), expected);
    }

    #[rstest]
    fn order_by_applies_tie_breakers() {
        let mut rows = vec![row("b", 1), row("a", 2), row("a", 1)];
        let order = OrderBy::asc("name").then("qty", SortDirection::Desc);
        rows.sort_by(|l, r| order.compare(l, r));
        let seen: Vec<_> = rows
            .iter()
            .map(|r| (r.0["name"].clone(), r.0["qty"].clone()))
            .collect();
        assert_eq!(
            seen,
            vec![
                (json!("a"), json!(2)),
                (json!("a"), json!(1)),
                (json!("b"), json!(1)),
            ]
        );
    }

    #[rstest]
    #[case(None, Some(json!(0)), Ordering::Less)]
    #[case(Some(json!(10)), Some(json!(9)), Ordering::Greater)]
    #[case(Some(json!(1.5)), Some(json!(1.25)), Ordering::Greater)]
    #[case(Some(json!("a")), Some(json!("a")), Ordering::Equal)]
    fn scalar_comparison(
        #[case] left: Option<Value>,
        #[case] right: Option<Value>,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_values(left.as_ref(), right.as_ref()), expected);
    }
}
