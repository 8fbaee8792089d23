//! API Routes
//!
//! Configures the Axum router with all listing backend endpoints.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_favorite_handler, create_property_handler, delete_property_handler,
    get_property_handler, health_handler, list_favorites_handler, list_properties_handler,
    list_recommendations_handler, login_handler, mark_read_handler, recommend_handler,
    register_handler, remove_favorite_handler, update_property_handler,
};
use super::state::AppState;
use crate::auth::require_auth;

/// Creates the main router.
///
/// `/api/auth/*` and `/health` are public; every other `/api` route runs
/// behind the bearer-token middleware.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth = Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler));

    let protected = Router::new()
        .route(
            "/properties",
            post(create_property_handler).get(list_properties_handler),
        )
        .route(
            "/properties/:id",
            get(get_property_handler)
                .put(update_property_handler)
                .delete(delete_property_handler),
        )
        .route("/properties/:id/recommend", post(recommend_handler))
        .route("/favorites", get(list_favorites_handler))
        .route(
            "/favorites/:id",
            post(add_favorite_handler).delete(remove_favorite_handler),
        )
        .route("/recommendations", get(list_recommendations_handler))
        .route("/recommendations/:id/read", put(mark_read_handler))
        .route_layer(from_fn_with_state(state.tokens.clone(), require_auth));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", Router::new().nest("/auth", auth).merge(protected))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
