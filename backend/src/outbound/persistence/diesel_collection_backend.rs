//! PostgreSQL-backed persistence for collection items.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{PersistenceBackend, RepositoryError, StagedWrite, UnitOfWork};
use crate::domain::{CollectionItem, Criteria, EntityId, OrderBy, SortDirection};

use super::error_mapping::map_diesel_error;
use super::models::CollectionItemRow;
use super::pool::DbPool;
use super::schema::collection_items;

type BoxedItems = collection_items::BoxedQuery<'static, Pg>;

/// Diesel adapter for [`PersistenceBackend<CollectionItem>`].
///
/// Staged writes are applied in a single transaction: persists become
/// `INSERT ... ON CONFLICT (id) DO UPDATE`, removals become `DELETE`.
#[derive(Clone)]
pub struct DieselCollectionBackend {
    pool: DbPool,
}

impl DieselCollectionBackend {
    /// Create a backend over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn text(field: &str, value: &Value) -> Result<String, RepositoryError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| RepositoryError::unsupported_field(format!("{field} (expects a string)")))
}

fn filtered(criteria: &Criteria) -> Result<BoxedItems, RepositoryError> {
    let mut query = collection_items::table.into_boxed();
    for (field, value) in criteria.iter() {
        query = match field {
            "id" => {
                let raw = text(field, value)?;
                let id = Uuid::parse_str(&raw)
                    .map_err(|_| RepositoryError::unsupported_field("id (expects a UUID)"))?;
                query.filter(collection_items::id.eq(id))
            }
            "name" => query.filter(collection_items::name.eq(text(field, value)?)),
            "set_code" => query.filter(collection_items::set_code.eq(text(field, value)?)),
            "condition" => query.filter(collection_items::condition.eq(text(field, value)?)),
            "quantity" => {
                let quantity = value
                    .as_i64()
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(|| RepositoryError::unsupported_field("quantity (expects an integer)"))?;
                query.filter(collection_items::quantity.eq(quantity))
            }
            other => return Err(RepositoryError::unsupported_field(other)),
        };
    }
    Ok(query)
}

fn ordered(mut query: BoxedItems, order_by: Option<&OrderBy>) -> Result<BoxedItems, RepositoryError> {
    use collection_items::dsl;

    for (field, direction) in order_by.into_iter().flat_map(OrderBy::iter) {
        let asc = direction == SortDirection::Asc;
        query = match (field, asc) {
            ("name", true) => query.then_order_by(dsl::name.asc()),
            ("name", false) => query.then_order_by(dsl::name.desc()),
            ("set_code", true) => query.then_order_by(dsl::set_code.asc()),
            ("set_code", false) => query.then_order_by(dsl::set_code.desc()),
            ("quantity", true) => query.then_order_by(dsl::quantity.asc()),
            ("quantity", false) => query.then_order_by(dsl::quantity.desc()),
            ("condition", true) => query.then_order_by(dsl::condition.asc()),
            ("condition", false) => query.then_order_by(dsl::condition.desc()),
            ("created_at", true) => query.then_order_by(dsl::created_at.asc()),
            ("created_at", false) => query.then_order_by(dsl::created_at.desc()),
            ("updated_at", true) => query.then_order_by(dsl::updated_at.asc()),
            ("updated_at", false) => query.then_order_by(dsl::updated_at.desc()),
            (other, _) => return Err(RepositoryError::unsupported_field(other)),
        };
    }
    Ok(query
        .then_order_by(dsl::created_at.asc())
        .then_order_by(dsl::id.asc()))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl PersistenceBackend<CollectionItem> for DieselCollectionBackend {
    async fn find(&self, id: &EntityId) -> Result<Option<CollectionItem>, RepositoryError> {
        let mut conn = self.pool.get().await?;
        let row = collection_items::table
            .find(*id.as_uuid())
            .select(CollectionItemRow::as_select())
            .first::<CollectionItemRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(CollectionItem::try_from).transpose()
    }

    async fn find_by(
        &self,
        criteria: &Criteria,
        order_by: Option<&OrderBy>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<CollectionItem>, RepositoryError> {
        let mut query = ordered(filtered(criteria)?, order_by)?;
        if let Some(limit) = limit {
            query = query.limit(to_i64(limit));
        }
        if let Some(offset) = offset {
            query = query.offset(to_i64(offset));
        }

        let mut conn = self.pool.get().await?;
        let rows: Vec<CollectionItemRow> = query
            .select(CollectionItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(CollectionItem::try_from).collect()
    }

    async fn count(&self, criteria: &Criteria) -> Result<u64, RepositoryError> {
        let query = filtered(criteria)?;
        let mut conn = self.pool.get().await?;
        let count: i64 = query
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn flush(&self, unit: UnitOfWork<CollectionItem>) -> Result<(), RepositoryError> {
        if unit.is_empty() {
            return Ok(());
        }
        let writes = unit.into_writes();
        let mut conn = self.pool.get().await?;
        conn.transaction(move |conn| {
            async move {
                for write in writes {
                    match write {
                        StagedWrite::Persist(item) => {
                            let row = CollectionItemRow::from(&item);
                            diesel::insert_into(collection_items::table)
                                .values(&row)
                                .on_conflict(collection_items::id)
                                .do_update()
                                .set(&row)
                                .execute(conn)
                                .await?;
                        }
                        StagedWrite::Remove(id) => {
                            diesel::delete(collection_items::table.find(*id.as_uuid()))
                                .execute(conn)
                                .await?;
                        }
                    }
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
