//! Document store contracts.
//!
//! One trait per collection so services depend only on what they touch.
//! `MemoryStore` and `MongoStore` implement all of them.

mod memory;
mod mongo;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::listing::{ListingFilter, Page};
use crate::models::{
    Favorite, Property, PropertyId, PropertyPatch, Recommendation, RecommendationId, User,
    UserId,
};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Document store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violated
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("database operation timed out")]
    Timeout,

    /// Stored document does not decode into its model
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// One handle per collection contract.
#[derive(Clone)]
pub struct Stores {
    pub properties: Arc<dyn PropertyStore>,
    pub users: Arc<dyn UserStore>,
    pub favorites: Arc<dyn FavoriteStore>,
    pub recommendations: Arc<dyn RecommendationStore>,
}

impl Stores {
    /// Every collection served by the same backend.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: PropertyStore + UserStore + FavoriteStore + RecommendationStore + 'static,
    {
        Self {
            properties: store.clone(),
            users: store.clone(),
            favorites: store.clone(),
            recommendations: store,
        }
    }
}

/// Runs a store call under `limit`, mapping elapse to `StoreError::Timeout`.
pub async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(StoreError::Timeout))
}

#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Matching properties, newest `created_at` first, windowed by `page`.
    async fn find(&self, filter: &ListingFilter, page: Page) -> Result<Vec<Property>, StoreError>;

    async fn find_by_id(&self, id: PropertyId) -> Result<Option<Property>, StoreError>;

    /// Like `find_by_id` but only when `owner` created the property.
    async fn find_owned(
        &self,
        id: PropertyId,
        owner: UserId,
    ) -> Result<Option<Property>, StoreError>;

    async fn insert(&self, property: Property) -> Result<(), StoreError>;

    /// Applies `patch` and stamps `updated_at`. `None` when the ID is absent.
    async fn update(
        &self,
        id: PropertyId,
        patch: &PropertyPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Property>, StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, id: PropertyId) -> Result<bool, StoreError>;

    async fn update_many(
        &self,
        filter: &ListingFilter,
        patch: &PropertyPatch,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    async fn delete_many(&self, filter: &ListingFilter) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with `Duplicate` when the e-mail is taken.
    async fn insert(&self, user: User) -> Result<(), StoreError>;
}

#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Fails with `Duplicate` when the pair already exists.
    async fn insert(&self, favorite: Favorite) -> Result<(), StoreError>;

    async fn delete(&self, user: UserId, property: PropertyId) -> Result<bool, StoreError>;

    /// The user's favorites in the order they were added.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Favorite>, StoreError>;
}

#[async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn insert(&self, recommendation: Recommendation) -> Result<(), StoreError>;

    /// Recommendations addressed to `recipient`, newest first.
    async fn list_for_recipient(
        &self,
        recipient: UserId,
    ) -> Result<Vec<Recommendation>, StoreError>;

    /// Marks read only when `recipient` is the addressee.
    async fn mark_read(
        &self,
        id: RecommendationId,
        recipient: UserId,
    ) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<(), StoreError> =
            bounded(Duration::from_millis(10), std::future::pending()).await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn test_bounded_passes_through() {
        let result = bounded(Duration::from_secs(1), async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
