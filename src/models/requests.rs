//! Request DTOs
//!
//! Incoming JSON bodies. Each exposes `validate()`, returning an error
//! message when the body is unacceptable and `None` when it is fine.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{Property, UserId};

/// Body of `POST /api/properties`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: f64,
    pub state: String,
    pub city: String,
    pub area_sq_ft: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub furnished: String,
    #[serde(default)]
    pub available_from: String,
    #[serde(default)]
    pub listed_by: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub color_theme: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub listing_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
}

impl PropertyRequest {
    pub fn validate(&self) -> Option<String> {
        let required = [
            ("title", &self.title),
            ("type", &self.kind),
            ("state", &self.state),
            ("city", &self.city),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Some(format!("Field '{}' is required", field));
        }
        check_amounts(&[
            ("price", Some(self.price)),
            ("areaSqFt", Some(self.area_sq_ft)),
            ("area", Some(self.area)),
            ("rating", Some(self.rating)),
        ])
    }

    /// Builds the stored document; the owner and timestamps come from the
    /// caller, never from the body.
    pub fn into_property(self, owner: UserId, now: DateTime<Utc>) -> Property {
        Property {
            title: self.title,
            kind: self.kind,
            price: self.price,
            state: self.state,
            city: self.city,
            location: self.location,
            area_sq_ft: self.area_sq_ft,
            area: self.area,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            amenities: self.amenities,
            features: self.features,
            furnished: self.furnished,
            available_from: self.available_from,
            listed_by: self.listed_by,
            tags: self.tags,
            color_theme: self.color_theme,
            rating: self.rating,
            is_verified: self.is_verified,
            listing_type: self.listing_type,
            status: self.status,
            description: self.description,
            ..Property::draft(owner, now)
        }
    }
}

/// Partial field set applied by `PUT /api/properties/:id` and bulk updates.
///
/// There is no owner field: ownership cannot be changed through a patch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub price: Option<f64>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub location: Option<String>,
    pub area_sq_ft: Option<f64>,
    pub area: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub amenities: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub furnished: Option<String>,
    pub available_from: Option<String>,
    pub listed_by: Option<String>,
    pub tags: Option<Vec<String>>,
    pub color_theme: Option<String>,
    pub rating: Option<f64>,
    pub is_verified: Option<bool>,
    pub listing_type: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

impl PropertyPatch {
    pub fn validate(&self) -> Option<String> {
        let required = [
            ("title", &self.title),
            ("type", &self.kind),
            ("state", &self.state),
            ("city", &self.city),
        ];
        for (field, value) in required {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Some(format!("Field '{}' cannot be blank", field));
            }
        }
        check_amounts(&[
            ("price", self.price),
            ("areaSqFt", self.area_sq_ft),
            ("area", self.area),
            ("rating", self.rating),
        ])
    }

    /// Copies every present field onto `property`.
    pub fn apply(&self, property: &mut Property) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut property.title, &self.title);
        set(&mut property.kind, &self.kind);
        set(&mut property.price, &self.price);
        set(&mut property.state, &self.state);
        set(&mut property.city, &self.city);
        set(&mut property.location, &self.location);
        set(&mut property.area_sq_ft, &self.area_sq_ft);
        set(&mut property.area, &self.area);
        set(&mut property.bedrooms, &self.bedrooms);
        set(&mut property.bathrooms, &self.bathrooms);
        set(&mut property.amenities, &self.amenities);
        set(&mut property.features, &self.features);
        set(&mut property.furnished, &self.furnished);
        set(&mut property.available_from, &self.available_from);
        set(&mut property.listed_by, &self.listed_by);
        set(&mut property.tags, &self.tags);
        set(&mut property.color_theme, &self.color_theme);
        set(&mut property.rating, &self.rating);
        set(&mut property.is_verified, &self.is_verified);
        set(&mut property.listing_type, &self.listing_type);
        set(&mut property.status, &self.status);
        set(&mut property.description, &self.description);
    }
}

fn check_amounts(amounts: &[(&str, Option<f64>)]) -> Option<String> {
    amounts.iter().find_map(|(field, value)| match value {
        Some(v) if !v.is_finite() || *v < 0.0 => {
            Some(format!("Field '{}' must be a non-negative number", field))
        }
        _ => None,
    })
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl RegisterRequest {
    pub const MIN_PASSWORD_LEN: usize = 6;

    pub fn validate(&self) -> Option<String> {
        if !is_valid_email(&self.email) {
            return Some("Invalid email address".to_string());
        }
        if self.password.chars().count() < Self::MIN_PASSWORD_LEN {
            return Some(format!(
                "Password must be at least {} characters",
                Self::MIN_PASSWORD_LEN
            ));
        }
        if self.name.trim().is_empty() {
            return Some("Name is required".to_string());
        }
        None
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Option<String> {
        if !is_valid_email(&self.email) {
            return Some("Invalid email address".to_string());
        }
        if self.password.is_empty() {
            return Some("Password is required".to_string());
        }
        None
    }
}

/// Body of `POST /api/properties/:id/recommend`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub to_user_email: String,
    #[serde(default)]
    pub message: String,
}

impl RecommendRequest {
    pub fn validate(&self) -> Option<String> {
        if !is_valid_email(&self.to_user_email) {
            return Some("Invalid recipient email address".to_string());
        }
        None
    }
}

/// Shape check only: a non-empty local part, one `@`, and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
