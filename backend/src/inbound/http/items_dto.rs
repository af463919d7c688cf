//! Request and response shapes for the `/items` endpoints.
//!
//! Request bodies arrive as raw JSON so that missing fields can be reported
//! together before any type conversion runs.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CardCondition, CardName, CollectionItem, Entity, Failure, FieldErrors, ItemChanges,
    ItemFilter, NewItem, Quantity, SetCode, ValueObjectError,
};

use super::controller::validate_required;

/// Collection item as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "Black Lotus")]
    pub name: String,
    #[schema(example = "LEA")]
    pub set_code: String,
    #[schema(example = 1)]
    pub quantity: u32,
    pub condition: CardCondition,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CollectionItem> for ItemResponse {
    fn from(item: &CollectionItem) -> Self {
        Self {
            id: item.id().to_string(),
            name: item.name().to_string(),
            set_code: item.set_code().to_string(),
            quantity: item.quantity().get(),
            condition: item.condition(),
            created_at: item.created_at(),
            updated_at: item.updated_at(),
        }
    }
}

impl From<CollectionItem> for ItemResponse {
    fn from(item: CollectionItem) -> Self {
        Self::from(&item)
    }
}

/// Body of `POST /items`, documentation only; handlers read raw JSON.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[schema(example = "Black Lotus")]
    pub name: String,
    #[schema(example = "LEA")]
    pub set_code: String,
    #[schema(example = 1, minimum = 1, maximum = 9999)]
    pub quantity: i64,
    /// Defaults to `near_mint`.
    pub condition: Option<CardCondition>,
}

/// Body of `PATCH /items/{id}`, documentation only.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[schema(example = 3, minimum = 1, maximum = 9999)]
    pub quantity: Option<i64>,
    pub condition: Option<CardCondition>,
}

fn record<T>(errors: &mut FieldErrors, field: &str, parsed: Result<T, ValueObjectError>) -> Option<T> {
    parsed
        .map_err(|err| {
            errors.insert(field.to_owned(), err.to_string());
        })
        .ok()
}

fn text<'a>(payload: &'a Value, field: &str, errors: &mut FieldErrors) -> Option<&'a str> {
    match payload.get(field) {
        Some(Value::String(value)) => Some(value.as_str()),
        _ => {
            errors.insert(field.to_owned(), "must be a string".to_owned());
            None
        }
    }
}

fn quantity(value: &Value, errors: &mut FieldErrors) -> Option<Quantity> {
    let Some(raw) = value.as_i64() else {
        errors.insert("quantity".to_owned(), "must be an integer".to_owned());
        return None;
    };
    record(errors, "quantity", Quantity::new(raw))
}

fn condition(value: &Value, errors: &mut FieldErrors) -> Option<CardCondition> {
    let Some(raw) = value.as_str() else {
        errors.insert("condition".to_owned(), "must be a string".to_owned());
        return None;
    };
    record(errors, "condition", CardCondition::from_str(raw))
}

fn present<'a>(payload: &'a Value, field: &str) -> Option<&'a Value> {
    payload.get(field).filter(|value| !value.is_null())
}

impl CreateItemRequest {
    /// Validate a raw body into [`NewItem`].
    ///
    /// Missing fields are reported first; only a complete body is checked
    /// for type and range errors.
    ///
    /// # Errors
    /// A validation [`Failure`] keyed by field name.
    pub fn from_payload(payload: &Value) -> Result<NewItem, Failure> {
        validate_required(payload, &["name", "setCode", "quantity"])?;

        let mut errors = FieldErrors::new();
        let name = text(payload, "name", &mut errors)
            .and_then(|raw| record(&mut errors, "name", CardName::new(raw)));
        let set_code = text(payload, "setCode", &mut errors)
            .and_then(|raw| record(&mut errors, "setCode", SetCode::new(raw)));
        let quantity = present(payload, "quantity").and_then(|v| quantity(v, &mut errors));
        let condition = match present(payload, "condition") {
            Some(value) => condition(value, &mut errors),
            None => Some(CardCondition::default()),
        };

        match (name, set_code, quantity, condition) {
            (Some(name), Some(set_code), Some(quantity), Some(condition)) if errors.is_empty() => {
                Ok(NewItem {
                    name,
                    set_code,
                    quantity,
                    condition,
                })
            }
            _ => Err(Failure::validation("Validation failed", errors)),
        }
    }
}

impl UpdateItemRequest {
    /// Validate a raw body into [`ItemChanges`]. At least one field is needed.
    ///
    /// # Errors
    /// A validation [`Failure`] keyed by field name.
    pub fn from_payload(payload: &Value) -> Result<ItemChanges, Failure> {
        let mut errors = FieldErrors::new();
        let mut changes = ItemChanges::default();
        if let Some(value) = present(payload, "quantity") {
            changes.quantity = quantity(value, &mut errors);
        }
        if let Some(value) = present(payload, "condition") {
            changes.condition = condition(value, &mut errors);
        }
        if errors.is_empty() && changes.is_empty() {
            errors.insert(
                "quantity".to_owned(),
                "provide quantity or condition".to_owned(),
            );
        }
        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(Failure::validation("Validation failed", errors))
        }
    }
}

/// Filters accepted by `GET /items`. Paging keys are read by
/// [`PageQuery`](super::controller::PageQuery).
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemListQuery {
    /// Exact card name.
    pub name: Option<String>,
    /// Exact set code.
    #[serde(alias = "setCode")]
    pub set_code: Option<String>,
    /// Condition, e.g. `near_mint`.
    pub condition: Option<String>,
}

impl From<ItemListQuery> for ItemFilter {
    fn from(query: ItemListQuery) -> Self {
        Self {
            name: query.name,
            set_code: query.set_code,
            condition: query.condition,
        }
    }
}
