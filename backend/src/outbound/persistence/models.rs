//! Diesel row structs for `collection_items`.
//!
//! Rows never leave the persistence module; the backend converts them to and
//! from [`CollectionItem`] at the boundary.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::collection_items;
use crate::domain::ports::RepositoryError;
use crate::domain::{
    CardCondition, CardName, CollectionItem, Entity, EntityCore, EntityId, Quantity, SetCode,
};

/// Full row, used for reads and upserts alike.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = collection_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CollectionItemRow {
    pub id: Uuid,
    pub name: String,
    pub set_code: String,
    pub quantity: i32,
    pub condition: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn corrupt(column: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::query(format!("stored {column} is invalid: {err}"))
}

impl TryFrom<CollectionItemRow> for CollectionItem {
    type Error = RepositoryError;

    fn try_from(row: CollectionItemRow) -> Result<Self, Self::Error> {
        let name = CardName::new(row.name).map_err(|err| corrupt("name", err))?;
        let set_code = SetCode::new(row.set_code).map_err(|err| corrupt("set_code", err))?;
        let quantity =
            Quantity::new(i64::from(row.quantity)).map_err(|err| corrupt("quantity", err))?;
        let condition = row
            .condition
            .parse::<CardCondition>()
            .map_err(|err| corrupt("condition", err))?;
        let core = EntityCore::restore(
            EntityId::from_uuid(row.id),
            row.created_at,
            row.updated_at,
        );
        Ok(Self::restore(core, name, set_code, quantity, condition))
    }
}

impl From<&CollectionItem> for CollectionItemRow {
    fn from(item: &CollectionItem) -> Self {
        Self {
            id: *item.id().as_uuid(),
            name: item.name().to_string(),
            set_code: item.set_code().to_string(),
            quantity: i32::try_from(item.quantity().get()).unwrap_or(i32::MAX),
            condition: item.condition().as_str().to_owned(),
            created_at: item.created_at(),
            updated_at: item.updated_at(),
        }
    }
}
