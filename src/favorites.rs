//! Per-user favorite properties.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{Favorite, FavoriteId, Property, PropertyId, UserId};
use crate::store::{bounded, FavoriteStore, PropertyStore, StoreError};

#[derive(Clone)]
pub struct FavoriteService {
    favorites: Arc<dyn FavoriteStore>,
    properties: Arc<dyn PropertyStore>,
    store_timeout: Duration,
}

impl FavoriteService {
    pub fn new(
        favorites: Arc<dyn FavoriteStore>,
        properties: Arc<dyn PropertyStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            favorites,
            properties,
            store_timeout,
        }
    }

    pub async fn add(&self, user: UserId, raw_property_id: &str) -> Result<Favorite> {
        let property_id: PropertyId = raw_property_id.parse()?;
        bounded(self.store_timeout, self.properties.find_by_id(property_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

        let favorite = Favorite {
            id: FavoriteId::new(),
            user_id: user,
            property_id,
            created_at: Utc::now(),
        };
        match bounded(self.store_timeout, self.favorites.insert(favorite.clone())).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(AppError::InvalidInput(
                    "Property already in favorites".to_string(),
                ))
            }
            Err(err) => return Err(err.into()),
        }

        info!(user = %user, property = %property_id, "favorite added");
        Ok(favorite)
    }

    pub async fn remove(&self, user: UserId, raw_property_id: &str) -> Result<()> {
        let property_id: PropertyId = raw_property_id.parse()?;
        let removed = bounded(self.store_timeout, self.favorites.delete(user, property_id)).await?;
        if !removed {
            return Err(AppError::NotFound("Favorite not found".to_string()));
        }
        info!(user = %user, property = %property_id, "favorite removed");
        Ok(())
    }

    /// The favorited properties that still exist, in the order they were added.
    pub async fn list(&self, user: UserId) -> Result<Vec<Property>> {
        let favorites = bounded(self.store_timeout, self.favorites.list_for_user(user)).await?;

        let mut properties = Vec::with_capacity(favorites.len());
        for favorite in favorites {
            if let Some(property) = bounded(
                self.store_timeout,
                self.properties.find_by_id(favorite.property_id),
            )
            .await?
            {
                properties.push(property);
            }
        }
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn setup() -> (FavoriteService, Arc<MemoryStore>, Property) {
        let store = Arc::new(MemoryStore::new());
        let property = Property::draft(UserId::new(), Utc::now());
        PropertyStore::insert(store.as_ref(), property.clone())
            .await
            .unwrap();
        let service = FavoriteService::new(store.clone(), store.clone(), Duration::from_secs(1));
        (service, store, property)
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let (service, _, property) = setup().await;
        let user = UserId::new();
        let id = property.id.to_string();

        let favorite = service.add(user, &id).await.unwrap();
        assert_eq!(favorite.property_id, property.id);
        assert_eq!(service.list(user).await.unwrap(), vec![property]);

        service.remove(user, &id).await.unwrap();
        assert!(service.list(user).await.unwrap().is_empty());
        assert!(matches!(
            service.remove(user, &id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_and_missing_property() {
        let (service, _, property) = setup().await;
        let user = UserId::new();
        let id = property.id.to_string();

        service.add(user, &id).await.unwrap();
        assert!(matches!(
            service.add(user, &id).await,
            Err(AppError::InvalidInput(ref m)) if m == "Property already in favorites"
        ));
        assert!(matches!(
            service.add(user, &PropertyId::new().to_string()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.add(user, "42").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_list_skips_deleted_properties() {
        let (service, store, property) = setup().await;
        let user = UserId::new();
        service.add(user, &property.id.to_string()).await.unwrap();

        PropertyStore::delete(store.as_ref(), property.id)
            .await
            .unwrap();
        assert!(service.list(user).await.unwrap().is_empty());
    }
}
