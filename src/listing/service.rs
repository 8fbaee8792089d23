//! Read-through listing cache and write-side invalidation.
//!
//! Reads consult the cache first and never re-validate a hit, so a page can
//! be stale for up to its TTL. Every successful write sweeps the whole
//! listing namespace (plus the item key on update and delete) before
//! returning. A failed write never touches the cache.
//!
//! A read that misses fills the cache only if no write was invalidated
//! while it queried the store. Every invalidation bumps a generation
//! counter; a reader that observes a different generation after its fill
//! removes what it wrote, so a page read before a write cannot outlive the
//! write's sweep.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use super::key::{item_key, list_key, ITEM_NAMESPACE, LIST_NAMESPACE};
use super::{ListingFilter, Page};
use crate::cache::CacheHandle;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Property, PropertyId, PropertyPatch, PropertyRequest, UserId};
use crate::store::{bounded, PropertyStore};

/// TTLs and timeouts governing the listing layer.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub list_ttl: Duration,
    pub item_ttl: Duration,
    pub store_timeout: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            list_ttl: Duration::from_secs(3600),
            item_ttl: Duration::from_secs(3600),
            store_timeout: Duration::from_secs(5),
        }
    }
}

impl CachePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            list_ttl: Duration::from_secs(config.list_cache_ttl),
            item_ttl: Duration::from_secs(config.item_cache_ttl),
            store_timeout: Duration::from_millis(config.db_timeout_ms),
        }
    }
}

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn PropertyStore>,
    cache: CacheHandle,
    policy: CachePolicy,
    /// Bumped by every invalidation, shared by all clones.
    generation: Arc<AtomicU64>,
}

impl ListingService {
    pub fn new(store: Arc<dyn PropertyStore>, cache: CacheHandle, policy: CachePolicy) -> Self {
        Self {
            store,
            cache,
            policy,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    // == List ==
    /// Serves one listing page. `raw_query` keys the cache; `filter` and
    /// `page` only matter on a miss.
    pub async fn list(
        &self,
        raw_query: &str,
        filter: &ListingFilter,
        page: Page,
    ) -> Result<Vec<Property>> {
        let key = list_key(raw_query);
        if let Some(cached) = self.cache.get_json::<Vec<Property>>(&key).await {
            debug!(key, "listing cache hit");
            return Ok(cached);
        }

        debug!(key, "listing cache miss");
        let seen = self.generation.load(Ordering::SeqCst);
        let properties = bounded(self.policy.store_timeout, self.store.find(filter, page)).await?;
        self.fill(&key, &properties, self.policy.list_ttl, seen).await;
        Ok(properties)
    }

    // == Get ==
    pub async fn get(&self, raw_id: &str) -> Result<Property> {
        let id: PropertyId = raw_id.parse()?;
        let key = item_key(id);
        if let Some(cached) = self.cache.get_json::<Property>(&key).await {
            debug!(key, "property cache hit");
            return Ok(cached);
        }

        let seen = self.generation.load(Ordering::SeqCst);
        let property = bounded(self.policy.store_timeout, self.store.find_by_id(id))
            .await?
            .ok_or_else(not_found)?;
        self.fill(&key, &property, self.policy.item_ttl, seen).await;
        Ok(property)
    }

    // == Create ==
    pub async fn create(&self, owner: UserId, request: PropertyRequest) -> Result<Property> {
        if let Some(message) = request.validate() {
            return Err(AppError::InvalidInput(message));
        }

        let property = request.into_property(owner, Utc::now());
        bounded(
            self.policy.store_timeout,
            self.store.insert(property.clone()),
        )
        .await?;

        self.invalidate(None).await;
        info!(property = %property.id, owner = %owner, "property created");
        Ok(property)
    }

    // == Update ==
    /// Applies `patch` to a property the caller owns.
    pub async fn update(
        &self,
        raw_id: &str,
        owner: UserId,
        patch: PropertyPatch,
    ) -> Result<Property> {
        let id: PropertyId = raw_id.parse()?;
        self.require_owned(id, owner).await?;
        if let Some(message) = patch.validate() {
            return Err(AppError::InvalidInput(message));
        }

        let updated = bounded(
            self.policy.store_timeout,
            self.store.update(id, &patch, Utc::now()),
        )
        .await?
        .ok_or_else(not_found)?;

        self.invalidate(Some(id)).await;
        info!(property = %id, "property updated");
        Ok(updated)
    }

    // == Delete ==
    pub async fn delete(&self, raw_id: &str, owner: UserId) -> Result<()> {
        let id: PropertyId = raw_id.parse()?;
        self.require_owned(id, owner).await?;

        let removed = bounded(self.policy.store_timeout, self.store.delete(id)).await?;
        if !removed {
            return Err(not_found());
        }

        self.invalidate(Some(id)).await;
        info!(property = %id, "property deleted");
        Ok(())
    }

    // == Bulk Maintenance ==
    /// Applies `patch` to every matching property. Returns the count.
    pub async fn bulk_update(
        &self,
        filter: &ListingFilter,
        patch: &PropertyPatch,
    ) -> Result<usize> {
        if let Some(message) = patch.validate() {
            return Err(AppError::InvalidInput(message));
        }
        let updated = bounded(
            self.policy.store_timeout,
            self.store.update_many(filter, patch, Utc::now()),
        )
        .await?;
        self.invalidate(None).await;
        // Item entries of the touched documents are not tracked individually.
        self.cache.sweep(ITEM_NAMESPACE).await;
        info!(updated, "bulk property update");
        Ok(updated)
    }

    /// Deletes every matching property. Returns the count.
    pub async fn bulk_delete(&self, filter: &ListingFilter) -> Result<usize> {
        let deleted = bounded(self.policy.store_timeout, self.store.delete_many(filter)).await?;
        self.invalidate(None).await;
        self.cache.sweep(ITEM_NAMESPACE).await;
        info!(deleted, "bulk property delete");
        Ok(deleted)
    }

    async fn require_owned(&self, id: PropertyId, owner: UserId) -> Result<Property> {
        bounded(self.policy.store_timeout, self.store.find_owned(id, owner))
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found or unauthorized".to_string()))
    }

    /// Caches a store result read at generation `seen`, unless an
    /// invalidation ran since. An invalidation landing during the write is
    /// caught by the second check.
    async fn fill<T: serde::Serialize>(&self, key: &str, value: &T, ttl: Duration, seen: u64) {
        if self.generation.load(Ordering::SeqCst) != seen {
            debug!(key, "skipping cache fill after concurrent write");
            return;
        }
        self.cache.set_json(key, value, ttl).await;
        if self.generation.load(Ordering::SeqCst) != seen {
            self.cache.delete(key).await;
        }
    }

    /// Drops every cached listing page and, when given, the item entry.
    async fn invalidate(&self, id: Option<PropertyId>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let swept = self.cache.sweep(LIST_NAMESPACE).await;
        if let Some(id) = id {
            self.cache.delete(&item_key(id)).await;
        }
        debug!(swept, "listing cache invalidated");
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Property not found".to_string())
}
