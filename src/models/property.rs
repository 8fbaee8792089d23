//! Property records as stored and served.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PropertyId, UserId};

/// A property listing document.
///
/// `created_by` is set once at creation and no update path touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: f64,
    pub state: String,
    pub city: String,
    pub location: String,
    pub area_sq_ft: f64,
    pub area: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub amenities: Vec<String>,
    pub features: Vec<String>,
    pub furnished: String,
    pub available_from: String,
    pub listed_by: String,
    pub tags: Vec<String>,
    pub color_theme: String,
    pub rating: f64,
    pub is_verified: bool,
    pub listing_type: String,
    pub status: String,
    pub description: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// A blank listing owned by `owner`, stamped at `now`.
    pub fn draft(owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: PropertyId::new(),
            title: String::new(),
            kind: String::new(),
            price: 0.0,
            state: String::new(),
            city: String::new(),
            location: String::new(),
            area_sq_ft: 0.0,
            area: 0.0,
            bedrooms: 0,
            bathrooms: 0,
            amenities: Vec::new(),
            features: Vec::new(),
            furnished: String::new(),
            available_from: String::new(),
            listed_by: String::new(),
            tags: Vec::new(),
            color_theme: String::new(),
            rating: 0.0,
            is_verified: false,
            listing_type: String::new(),
            status: String::new(),
            description: String::new(),
            created_by: owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves `updated_at` forward, never before `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_serializes_camel_case_with_type_field() {
        let property = Property::draft(UserId::new(), Utc::now());
        let json = serde_json::to_value(&property).unwrap();

        assert!(json.get("type").is_some());
        assert!(json.get("areaSqFt").is_some());
        assert!(json.get("createdBy").is_some());
        assert!(json.get("isVerified").is_some());
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_touch_never_precedes_creation() {
        let now = Utc::now();
        let mut property = Property::draft(UserId::new(), now);

        property.touch(now - Duration::hours(1));
        assert_eq!(property.updated_at, now);

        property.touch(now + Duration::hours(1));
        assert_eq!(property.updated_at, now + Duration::hours(1));
    }
}
