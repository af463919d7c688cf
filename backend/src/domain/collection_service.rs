//! Use cases over the card collection.
//!
//! Expected failures (unknown id, duplicate card, bad filter) come back as
//! [`Outcome::Failure`]; `Err` is reserved for infrastructure faults.

use std::str::FromStr;
use std::sync::Arc;

use mockable::Clock;
use pagination::{PaginatedResult, Pagination};
use tracing::{debug, info};

use super::ports::{CacheKey, Repository};
use super::{
    CacheManager, CardCondition, CardName, CollectionItem, Criteria, Entity, EntityId, Error,
    Failure, FieldErrors, ItemChanges, OrderBy, Outcome, Quantity, SetCode, SortDirection,
};

const COUNT_PREFIX: &str = "items:count";
const VERSION_KEY: &str = "items:version";

/// Validated input for a new collection item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Card name.
    pub name: CardName,
    /// Set code.
    pub set_code: SetCode,
    /// Copies held.
    pub quantity: Quantity,
    /// Grade.
    pub condition: CardCondition,
}

/// Raw list filters as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Exact card name.
    pub name: Option<String>,
    /// Exact set code.
    pub set_code: Option<String>,
    /// Condition spelling, e.g. `near_mint`.
    pub condition: Option<String>,
}

impl ItemFilter {
    /// Convert to repository criteria, collecting every invalid filter.
    ///
    /// # Errors
    /// Field errors keyed by the offending filter name.
    pub fn to_criteria(&self) -> Result<Criteria, FieldErrors> {
        let mut criteria = Criteria::new();
        let mut errors = FieldErrors::new();
        if let Some(name) = self.name.as_deref().filter(|v| !v.is_empty()) {
            criteria.insert("name", name);
        }
        if let Some(set_code) = self.set_code.as_deref().filter(|v| !v.is_empty()) {
            criteria.insert("set_code", set_code);
        }
        if let Some(raw) = self.condition.as_deref().filter(|v| !v.is_empty()) {
            match CardCondition::from_str(raw) {
                Ok(condition) => criteria.insert("condition", condition.as_str()),
                Err(err) => {
                    errors.insert("condition".to_owned(), err.to_string());
                }
            }
        }
        if errors.is_empty() {
            Ok(criteria)
        } else {
            Err(errors)
        }
    }
}

/// Collection use cases.
#[derive(Clone)]
pub struct CollectionService {
    items: Arc<dyn Repository<CollectionItem>>,
    cache: CacheManager,
    clock: Arc<dyn Clock>,
}

impl CollectionService {
    /// Compose the service.
    pub fn new(
        items: Arc<dyn Repository<CollectionItem>>,
        cache: CacheManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            items,
            cache,
            clock,
        }
    }

    fn listing_order() -> OrderBy {
        OrderBy::asc("name").then("set_code", SortDirection::Asc)
    }

    fn static_key(raw: &str) -> Result<CacheKey, Error> {
        CacheKey::new(raw).map_err(|err| Error::internal(format!("invalid cache key: {err}")))
    }

    async fn count_key(&self, criteria: &Criteria) -> Result<CacheKey, Error> {
        let version = self
            .cache
            .fetch::<i64>(&Self::static_key(VERSION_KEY)?)
            .await
            .unwrap_or(0);
        let encoded = serde_json::to_string(criteria)
            .map_err(|err| Error::internal(format!("failed to encode criteria: {err}")))?;
        CacheKey::hashed(COUNT_PREFIX, [version.to_string(), encoded])
            .map_err(|err| Error::internal(format!("invalid cache key: {err}")))
    }

    async fn invalidate_counts(&self) -> Result<(), Error> {
        let version = self.cache.increment(&Self::static_key(VERSION_KEY)?, 1).await;
        debug!(?version, "item counts invalidated");
        Ok(())
    }

    async fn load(&self, id: &EntityId) -> Result<Option<CollectionItem>, Error> {
        Ok(self.items.find_by_id(id).await?)
    }

    fn missing(id: &EntityId) -> Failure {
        Failure::not_found(format!("collection item {id} not found"))
    }

    /// One page of items matching `filter`, ordered by name then set.
    ///
    /// The total is cached per filter until the next write.
    ///
    /// # Errors
    /// Repository faults.
    pub async fn list(
        &self,
        filter: &ItemFilter,
        window: Pagination,
    ) -> Result<Outcome<PaginatedResult<CollectionItem>>, Error> {
        let criteria = match filter.to_criteria() {
            Ok(criteria) => criteria,
            Err(errors) => return Ok(Failure::validation("Invalid filters", errors).into()),
        };
        let key = self.count_key(&criteria).await?;
        let total = self
            .cache
            .remember_default(&key, || self.items.count(&criteria))
            .await?;
        let order = Self::listing_order();
        let items = self
            .items
            .find_by(
                &criteria,
                Some(&order),
                Some(u64::from(window.per_page())),
                Some(window.offset()),
            )
            .await?;
        Ok(Outcome::success(PaginatedResult::new(items, total, window)))
    }

    /// Item by id.
    ///
    /// # Errors
    /// Repository faults.
    pub async fn get(&self, id: &EntityId) -> Result<Outcome<CollectionItem>, Error> {
        Ok(match self.load(id).await? {
            Some(item) => Outcome::success(item),
            None => Self::missing(id).into(),
        })
    }

    /// Add a card unless the same name and set is already held.
    ///
    /// # Errors
    /// Repository faults.
    pub async fn add(&self, input: NewItem) -> Result<Outcome<CollectionItem>, Error> {
        let duplicate = Criteria::new()
            .with("name", input.name.as_str())
            .with("set_code", input.set_code.as_str());
        if self.items.exists(&duplicate).await? {
            return Ok(Failure::conflict(format!(
                "{} ({}) is already in the collection",
                input.name, input.set_code
            ))
            .into());
        }

        let mut item = CollectionItem::new(
            input.name,
            input.set_code,
            input.quantity,
            input.condition,
            self.clock.as_ref(),
        );
        self.items.save(&mut item).await?;
        self.invalidate_counts().await?;
        info!(item_id = %item.id(), "collection item added");
        Ok(Outcome::success(item))
    }

    /// Change quantity or condition. Saving is skipped when nothing changed.
    ///
    /// # Errors
    /// Repository faults.
    pub async fn update(
        &self,
        id: &EntityId,
        changes: ItemChanges,
    ) -> Result<Outcome<CollectionItem>, Error> {
        let Some(mut item) = self.load(id).await? else {
            return Ok(Self::missing(id).into());
        };
        if item.apply(changes, self.clock.as_ref()) {
            self.items.save(&mut item).await?;
            self.invalidate_counts().await?;
        }
        Ok(Outcome::success(item))
    }

    /// Remove an item.
    ///
    /// # Errors
    /// Repository faults.
    pub async fn remove(&self, id: &EntityId) -> Result<Outcome<()>, Error> {
        let Some(mut item) = self.load(id).await? else {
            return Ok(Self::missing(id).into());
        };
        item.mark_removed(self.clock.as_ref());
        self.items.remove(&mut item).await?;
        self.invalidate_counts().await?;
        info!(item_id = %id, "collection item removed");
        Ok(Outcome::success(()))
    }
}
