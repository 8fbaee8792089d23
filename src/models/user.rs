//! Accounts, favorites and peer recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FavoriteId, Property, PropertyId, RecommendationId, UserId};

/// A registered account. The password hash never leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: RecommendationId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub property_id: PropertyId,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// A recommendation expanded with the property and its sender.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationDetails {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub property: Property,
    pub sender: UserProfile,
}
