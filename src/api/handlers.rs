//! API Handlers
//!
//! Thin adapters from HTTP to the services. Protected handlers read the
//! acting user from the `AuthUser` extension set by the auth middleware.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, RawQuery, State},
    http::StatusCode,
    Extension, Json,
};

use super::state::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::listing::{ListingFilter, Page};
use crate::models::{
    AuthResponse, Favorite, HealthResponse, LoginRequest, MessageResponse, Property,
    PropertyPatch, PropertyRequest, RecommendRequest, Recommendation, RecommendationDetails,
    RegisterRequest,
};

/// Unwraps a JSON body, reporting malformed payloads as `InvalidInput`.
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

// == Accounts ==
/// Handler for POST /api/auth/register
pub async fn register_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let response = state.accounts.register(body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for POST /api/auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.accounts.login(body(payload)?).await?))
}

// == Properties ==
/// Handler for GET /api/properties
///
/// The raw query string keys the listing cache as received; the decoded
/// pairs drive filtering and paging on a miss.
pub async fn list_properties_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Property>>> {
    let filter = ListingFilter::from_params(&params);
    let page = Page::from_params(&params, state.max_page_size);
    let properties = state
        .listings
        .list(raw.as_deref().unwrap_or_default(), &filter, page)
        .await?;
    Ok(Json(properties))
}

/// Handler for POST /api/properties
pub async fn create_property_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<PropertyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Property>)> {
    let property = state.listings.create(user.id, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// Handler for GET /api/properties/:id
pub async fn get_property_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Property>> {
    Ok(Json(state.listings.get(&id).await?))
}

/// Handler for PUT /api/properties/:id
pub async fn update_property_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<PropertyPatch>, JsonRejection>,
) -> Result<Json<Property>> {
    let property = state.listings.update(&id, user.id, body(payload)?).await?;
    Ok(Json(property))
}

/// Handler for DELETE /api/properties/:id
pub async fn delete_property_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.listings.delete(&id, user.id).await?;
    Ok(Json(MessageResponse::new("Property deleted successfully")))
}

// == Favorites ==
pub async fn add_favorite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Favorite>)> {
    let favorite = state.favorites.add(user.id, &id).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn remove_favorite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.favorites.remove(user.id, &id).await?;
    Ok(Json(MessageResponse::new("Property removed from favorites")))
}

pub async fn list_favorites_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Property>>> {
    Ok(Json(state.favorites.list(user.id).await?))
}

// == Recommendations ==
/// Handler for POST /api/properties/:id/recommend
pub async fn recommend_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Recommendation>)> {
    let recommendation = state
        .recommendations
        .recommend(user.id, &id, body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(recommendation)))
}

pub async fn list_recommendations_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<RecommendationDetails>>> {
    Ok(Json(state.recommendations.list(user.id).await?))
}

/// Handler for PUT /api/recommendations/:id/read
pub async fn mark_read_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.recommendations.mark_read(user.id, &id).await?;
    Ok(Json(MessageResponse::new("Recommendation marked as read")))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache_enabled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::BcryptHasher;
    use crate::config::Config;
    use crate::models::UserId;
    use crate::api::state::Backends;
    use std::sync::Arc;

    fn state() -> AppState {
        let config = Config::default();
        let mut backends = Backends::in_memory(&config);
        backends.hasher = Arc::new(BcryptHasher::new(4));
        AppState::new(&config, &backends)
    }

    fn pairs(raw: &str) -> Vec<(String, String)> {
        raw.split('&')
            .filter_map(|p| p.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn create_request() -> PropertyRequest {
        serde_json::from_value(serde_json::json!({
            "title": "Loft", "type": "apartment", "price": 250000, "state": "NY",
            "city": "New York", "areaSqFt": 900, "bedrooms": 2, "bathrooms": 1
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list_and_get() {
        let state = state();
        let user = AuthUser { id: UserId::new() };

        let (status, Json(created)) = create_property_handler(
            State(state.clone()),
            Extension(user),
            Ok(Json(create_request())),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.created_by, user.id);

        let Json(listed) = list_properties_handler(
            State(state.clone()),
            RawQuery(Some("type=apartment".to_string())),
            Query(pairs("type=apartment")),
        )
        .await
        .unwrap();
        assert_eq!(listed, vec![created.clone()]);

        let Json(fetched) = get_property_handler(State(state), Path(created.id.to_string()))
            .await
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_delete_by_stranger_is_not_found() {
        let state = state();
        let owner = AuthUser { id: UserId::new() };
        let (_, Json(created)) = create_property_handler(
            State(state.clone()),
            Extension(owner),
            Ok(Json(create_request())),
        )
        .await
        .unwrap();

        let result = delete_property_handler(
            State(state),
            Extension(AuthUser { id: UserId::new() }),
            Path(created.id.to_string()),
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let Json(response) = health_handler(State(state())).await;
        assert_eq!(response.status, "healthy");
        assert!(response.cache_enabled);
    }
}
