//! Property recommendations between users.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{
    PropertyId, RecommendRequest, Recommendation, RecommendationDetails, RecommendationId, UserId,
};
use crate::store::{bounded, PropertyStore, RecommendationStore, UserStore};

#[derive(Clone)]
pub struct RecommendationService {
    recommendations: Arc<dyn RecommendationStore>,
    properties: Arc<dyn PropertyStore>,
    users: Arc<dyn UserStore>,
    store_timeout: Duration,
}

impl RecommendationService {
    pub fn new(
        recommendations: Arc<dyn RecommendationStore>,
        properties: Arc<dyn PropertyStore>,
        users: Arc<dyn UserStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            recommendations,
            properties,
            users,
            store_timeout,
        }
    }

    pub async fn recommend(
        &self,
        from: UserId,
        raw_property_id: &str,
        request: RecommendRequest,
    ) -> Result<Recommendation> {
        let property_id: PropertyId = raw_property_id.parse()?;
        if let Some(message) = request.validate() {
            return Err(AppError::InvalidInput(message));
        }

        let email = request.to_user_email.trim().to_lowercase();
        let recipient = bounded(self.store_timeout, self.users.find_by_email(&email))
            .await?
            .ok_or_else(|| AppError::NotFound("Recipient user not found".to_string()))?;
        bounded(self.store_timeout, self.properties.find_by_id(property_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

        let recommendation = Recommendation {
            id: RecommendationId::new(),
            from_user_id: from,
            to_user_id: recipient.id,
            property_id,
            message: request.message,
            created_at: Utc::now(),
            is_read: false,
        };
        bounded(
            self.store_timeout,
            self.recommendations.insert(recommendation.clone()),
        )
        .await?;

        info!(
            from = %from,
            to = %recipient.id,
            property = %property_id,
            "property recommended"
        );
        Ok(recommendation)
    }

    /// Recommendations addressed to `user`, newest first. Entries whose
    /// property or sender is gone are dropped.
    pub async fn list(&self, user: UserId) -> Result<Vec<RecommendationDetails>> {
        let received = bounded(
            self.store_timeout,
            self.recommendations.list_for_recipient(user),
        )
        .await?;

        let mut details = Vec::with_capacity(received.len());
        for recommendation in received {
            let property = bounded(
                self.store_timeout,
                self.properties.find_by_id(recommendation.property_id),
            )
            .await?;
            let sender = bounded(
                self.store_timeout,
                self.users.find_by_id(recommendation.from_user_id),
            )
            .await?;

            if let (Some(property), Some(sender)) = (property, sender) {
                details.push(RecommendationDetails {
                    recommendation,
                    property,
                    sender: sender.profile(),
                });
            }
        }
        Ok(details)
    }

    pub async fn mark_read(&self, user: UserId, raw_id: &str) -> Result<()> {
        let id: RecommendationId = raw_id.parse()?;
        let marked = bounded(self.store_timeout, self.recommendations.mark_read(id, user)).await?;
        if !marked {
            return Err(AppError::NotFound("Recommendation not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Property, User};
    use crate::store::MemoryStore;
    use chrono::Duration as ChronoDuration;

    struct Fixture {
        service: RecommendationService,
        store: Arc<MemoryStore>,
        alice: User,
        bob: User,
        property: Property,
    }

    fn user(email: &str) -> User {
        User {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: String::new(),
            name: email.split('@').next().unwrap_or_default().to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let alice = user("alice@example.com");
        let bob = user("bob@example.com");
        UserStore::insert(store.as_ref(), alice.clone()).await.unwrap();
        UserStore::insert(store.as_ref(), bob.clone()).await.unwrap();
        let property = Property::draft(alice.id, Utc::now());
        PropertyStore::insert(store.as_ref(), property.clone())
            .await
            .unwrap();

        let service = RecommendationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Duration::from_secs(1),
        );
        Fixture {
            service,
            store,
            alice,
            bob,
            property,
        }
    }

    fn to(email: &str) -> RecommendRequest {
        RecommendRequest {
            to_user_email: email.to_string(),
            message: "have a look".to_string(),
        }
    }

    #[tokio::test]
    async fn test_recommend_then_list_with_details() {
        let f = fixture().await;
        let created = f
            .service
            .recommend(f.alice.id, &f.property.id.to_string(), to("bob@example.com"))
            .await
            .unwrap();
        assert!(!created.is_read);
        assert_eq!(created.to_user_id, f.bob.id);

        let inbox = f.service.list(f.bob.id).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].recommendation, created);
        assert_eq!(inbox[0].property.id, f.property.id);
        assert_eq!(inbox[0].sender, f.alice.profile());
        assert!(f.service.list(f.alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recommend_failures() {
        let f = fixture().await;
        let id = f.property.id.to_string();

        assert!(matches!(
            f.service.recommend(f.alice.id, &id, to("carol@example.com")).await,
            Err(AppError::NotFound(ref m)) if m == "Recipient user not found"
        ));
        assert!(matches!(
            f.service.recommend(f.alice.id, &id, to("bob")).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            f.service
                .recommend(f.alice.id, &PropertyId::new().to_string(), to("bob@example.com"))
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.recommend(f.alice.id, "xyz", to("bob@example.com")).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_skips_deleted_properties() {
        let f = fixture().await;
        let older = Property::draft(f.alice.id, Utc::now() - ChronoDuration::hours(1));
        PropertyStore::insert(f.store.as_ref(), older.clone())
            .await
            .unwrap();

        f.service
            .recommend(f.alice.id, &older.id.to_string(), to("bob@example.com"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        f.service
            .recommend(f.alice.id, &f.property.id.to_string(), to("bob@example.com"))
            .await
            .unwrap();

        let inbox = f.service.list(f.bob.id).await.unwrap();
        assert_eq!(inbox[0].property.id, f.property.id);
        assert_eq!(inbox[1].property.id, older.id);

        PropertyStore::delete(f.store.as_ref(), older.id).await.unwrap();
        assert_eq!(f.service.list(f.bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_recipient_marks_read() {
        let f = fixture().await;
        let created = f
            .service
            .recommend(f.alice.id, &f.property.id.to_string(), to("bob@example.com"))
            .await
            .unwrap();
        let id = created.id.to_string();

        assert!(matches!(
            f.service.mark_read(f.alice.id, &id).await,
            Err(AppError::NotFound(_))
        ));
        f.service.mark_read(f.bob.id, &id).await.unwrap();
        assert!(f.service.list(f.bob.id).await.unwrap()[0].recommendation.is_read);
    }
}
