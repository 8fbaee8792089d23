//! In-process document store.
//!
//! Collections are insertion-ordered vectors behind async locks. Listing
//! sorts are stable, so documents sharing a `created_at` come back newest
//! insertion first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{FavoriteStore, PropertyStore, RecommendationStore, StoreError, UserStore};
use crate::listing::{ListingFilter, Page};
use crate::models::{
    Favorite, Property, PropertyId, PropertyPatch, Recommendation, RecommendationId, User,
    UserId,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    properties: RwLock<Vec<Property>>,
    users: RwLock<Vec<User>>,
    favorites: RwLock<Vec<Favorite>>,
    recommendations: RwLock<Vec<Recommendation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn find(&self, filter: &ListingFilter, page: Page) -> Result<Vec<Property>, StoreError> {
        let properties = self.properties.read().await;
        let mut matched: Vec<&Property> =
            properties.iter().rev().filter(|p| filter.matches(p)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matched
            .into_iter()
            .skip(page.skip())
            .take(page.limit())
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: PropertyId) -> Result<Option<Property>, StoreError> {
        let properties = self.properties.read().await;
        Ok(properties.iter().find(|p| p.id == id).cloned())
    }

    async fn find_owned(
        &self,
        id: PropertyId,
        owner: UserId,
    ) -> Result<Option<Property>, StoreError> {
        let properties = self.properties.read().await;
        Ok(properties
            .iter()
            .find(|p| p.id == id && p.created_by == owner)
            .cloned())
    }

    async fn insert(&self, property: Property) -> Result<(), StoreError> {
        let mut properties = self.properties.write().await;
        if properties.iter().any(|p| p.id == property.id) {
            return Err(StoreError::Duplicate("property id"));
        }
        properties.push(property);
        Ok(())
    }

    async fn update(
        &self,
        id: PropertyId,
        patch: &PropertyPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Property>, StoreError> {
        let mut properties = self.properties.write().await;
        Ok(properties.iter_mut().find(|p| p.id == id).map(|property| {
            patch.apply(property);
            property.touch(now);
            property.clone()
        }))
    }

    async fn delete(&self, id: PropertyId) -> Result<bool, StoreError> {
        let mut properties = self.properties.write().await;
        let before = properties.len();
        properties.retain(|p| p.id != id);
        Ok(properties.len() < before)
    }

    async fn update_many(
        &self,
        filter: &ListingFilter,
        patch: &PropertyPatch,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut properties = self.properties.write().await;
        let mut updated = 0;
        for property in properties.iter_mut().filter(|p| filter.matches(p)) {
            patch.apply(property);
            property.touch(now);
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_many(&self, filter: &ListingFilter) -> Result<usize, StoreError> {
        let mut properties = self.properties.write().await;
        let before = properties.len();
        properties.retain(|p| !filter.matches(p));
        Ok(before - properties.len())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        users.push(user);
        Ok(())
    }
}

#[async_trait]
impl FavoriteStore for MemoryStore {
    async fn insert(&self, favorite: Favorite) -> Result<(), StoreError> {
        let mut favorites = self.favorites.write().await;
        if favorites
            .iter()
            .any(|f| f.user_id == favorite.user_id && f.property_id == favorite.property_id)
        {
            return Err(StoreError::Duplicate("favorite"));
        }
        favorites.push(favorite);
        Ok(())
    }

    async fn delete(&self, user: UserId, property: PropertyId) -> Result<bool, StoreError> {
        let mut favorites = self.favorites.write().await;
        let before = favorites.len();
        favorites.retain(|f| !(f.user_id == user && f.property_id == property));
        Ok(favorites.len() < before)
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Favorite>, StoreError> {
        let favorites = self.favorites.read().await;
        Ok(favorites.iter().filter(|f| f.user_id == user).cloned().collect())
    }
}

#[async_trait]
impl RecommendationStore for MemoryStore {
    async fn insert(&self, recommendation: Recommendation) -> Result<(), StoreError> {
        self.recommendations.write().await.push(recommendation);
        Ok(())
    }

    async fn list_for_recipient(
        &self,
        recipient: UserId,
    ) -> Result<Vec<Recommendation>, StoreError> {
        let recommendations = self.recommendations.read().await;
        let mut addressed: Vec<Recommendation> = recommendations
            .iter()
            .rev()
            .filter(|r| r.to_user_id == recipient)
            .cloned()
            .collect();
        addressed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(addressed)
    }

    async fn mark_read(
        &self,
        id: RecommendationId,
        recipient: UserId,
    ) -> Result<bool, StoreError> {
        let mut recommendations = self.recommendations.write().await;
        match recommendations
            .iter_mut()
            .find(|r| r.id == id && r.to_user_id == recipient)
        {
            Some(recommendation) => {
                recommendation.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
