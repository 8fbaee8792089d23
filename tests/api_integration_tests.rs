//! Integration Tests for API Endpoints
//!
//! Drives the full router: authentication, listing reads through the cache,
//! writes and their invalidation, favorites and recommendations.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use property_listing::{auth::BcryptHasher, create_router, AppState, Backends, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app_with(config: Config) -> Router {
    let mut backends = Backends::in_memory(&config);
    backends.hasher = Arc::new(BcryptHasher::new(4));
    create_router(AppState::new(&config, &backends))
}

fn create_test_app() -> Router {
    create_test_app_with(Config::default())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": email, "password": "secret1", "name": "Tester"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["token"].as_str().unwrap().to_string()
}

fn listing(title: &str, price: f64, bedrooms: u32) -> Value {
    json!({
        "title": title,
        "type": "apartment",
        "price": price,
        "state": "TX",
        "city": "Austin",
        "areaSqFt": 850,
        "bedrooms": bedrooms,
        "bathrooms": 1,
        "tags": ["a", "b"],
        "amenities": ["pool"]
    })
}

async fn create(app: &Router, token: &str, body: Value) -> Value {
    let (status, json) = send(app, "POST", "/api/properties", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json
}

fn titles(json: &Value) -> Vec<&str> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect()
}

// == Accounts ==

#[tokio::test]
async fn test_register_then_login() {
    let app = create_test_app();
    register(&app, "ana@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "ana@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["token"].is_string());
    assert_eq!(json["user"]["email"], "ana@example.com");
    assert!(json["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_and_bad_login() {
    let app = create_test_app();
    register(&app, "ana@example.com").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "ana@example.com", "password": "secret1", "name": "Ana"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Email already registered");

    let (status, json) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "ana@example.com", "password": "wrong-one"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_protected_routes_reject_missing_token() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/api/properties", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].is_string());

    let (status, _) = send(&app, "GET", "/api/favorites", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// == Properties ==

#[tokio::test]
async fn test_writes_are_visible_to_subsequent_listings() {
    let app = create_test_app();
    let token = register(&app, "owner@example.com").await;

    let created = create(&app, &token, listing("Loft", 100.0, 2)).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (_, first) = send(&app, "GET", "/api/properties?bedrooms=2", Some(&token), None).await;
    assert_eq!(titles(&first), vec!["Loft"]);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/properties/{id}"),
        Some(&token),
        Some(json!({"title": "Loft Deluxe"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Loft Deluxe");
    assert_eq!(updated["createdBy"], created["createdBy"]);

    let (_, second) = send(&app, "GET", "/api/properties?bedrooms=2", Some(&token), None).await;
    assert_eq!(titles(&second), vec!["Loft Deluxe"]);

    let (status, deleted) = send(
        &app,
        "DELETE",
        &format!("/api/properties/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({"message": "Property deleted successfully"}));

    let (_, third) = send(&app, "GET", "/api/properties?bedrooms=2", Some(&token), None).await;
    assert!(third.as_array().unwrap().is_empty());

    let (status, json) = send(&app, "GET", &format!("/api/properties/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Property not found");
}

#[tokio::test]
async fn test_filters_over_http() {
    let app = create_test_app();
    let token = register(&app, "owner@example.com").await;
    create(&app, &token, listing("cheap", 100.0, 2)).await;
    create(&app, &token, listing("pricey", 200.0, 2)).await;

    let (_, json) = send(&app, "GET", "/api/properties?priceMin=150", Some(&token), None).await;
    assert_eq!(titles(&json), vec!["pricey"]);

    let (_, json) = send(&app, "GET", "/api/properties?priceMin=abc", Some(&token), None).await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (_, json) = send(&app, "GET", "/api/properties?tags=b,c", Some(&token), None).await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (_, json) = send(
        &app,
        "GET",
        "/api/properties?amenities=pool,gym",
        Some(&token),
        None,
    )
    .await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_second_page_is_newest_first() {
    let app = create_test_app();
    let token = register(&app, "owner@example.com").await;
    for i in 1..=25 {
        create(&app, &token, listing(&format!("p{i}"), 1.0, 1)).await;
    }

    let (status, json) = send(
        &app,
        "GET",
        "/api/properties?page=2&limit=10",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let expected: Vec<String> = (6..=15).rev().map(|i| format!("p{i}")).collect();
    assert_eq!(titles(&json), expected);
}

#[tokio::test]
async fn test_property_error_statuses() {
    let app = create_test_app();
    let owner = register(&app, "owner@example.com").await;
    let stranger = register(&app, "stranger@example.com").await;
    let created = create(&app, &owner, listing("Loft", 100.0, 2)).await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(&app, "GET", "/api/properties/not-an-id", Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/properties/{id}"),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Property not found or unauthorized");

    let (status, json) = send(
        &app,
        "POST",
        "/api/properties",
        Some(&owner),
        Some(json!({"title": "missing fields"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_disabled_cache_serves_everything() {
    let config = Config {
        cache_enabled: false,
        ..Config::default()
    };
    let app = create_test_app_with(config);
    let token = register(&app, "owner@example.com").await;
    create(&app, &token, listing("Loft", 100.0, 2)).await;

    let (_, json) = send(&app, "GET", "/api/properties", Some(&token), None).await;
    assert_eq!(titles(&json), vec!["Loft"]);

    let (_, health) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(health["cache_enabled"], false);
}

// == Favorites and Recommendations ==

#[tokio::test]
async fn test_favorites_flow() {
    let app = create_test_app();
    let token = register(&app, "fan@example.com").await;
    let created = create(&app, &token, listing("Loft", 100.0, 2)).await;
    let uri = format!("/api/favorites/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Property already in favorites");

    let (_, json) = send(&app, "GET", "/api/favorites", Some(&token), None).await;
    assert_eq!(titles(&json), vec!["Loft"]);

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendation_flow() {
    let app = create_test_app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;
    let created = create(&app, &alice, listing("Loft", 100.0, 2)).await;
    let property_id = created["id"].as_str().unwrap();

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/properties/{property_id}/recommend"),
        Some(&alice),
        Some(json!({"toUserEmail": "carol@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Recipient user not found");

    let (status, recommendation) = send(
        &app,
        "POST",
        &format!("/api/properties/{property_id}/recommend"),
        Some(&alice),
        Some(json!({"toUserEmail": "bob@example.com", "message": "look"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(recommendation["isRead"], false);

    let (_, inbox) = send(&app, "GET", "/api/recommendations", Some(&bob), None).await;
    let inbox = inbox.as_array().unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["property"]["title"], "Loft");
    assert_eq!(inbox[0]["sender"]["email"], "alice@example.com");

    let read_uri = format!(
        "/api/recommendations/{}/read",
        recommendation["id"].as_str().unwrap()
    );
    let (status, _) = send(&app, "PUT", &read_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "PUT", &read_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, inbox) = send(&app, "GET", "/api/recommendations", Some(&bob), None).await;
    assert_eq!(inbox[0]["isRead"], true);
}

// == Health ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();
    let (status, json) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}
