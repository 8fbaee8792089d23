//! API Module
//!
//! HTTP handlers, shared state and routing for the listing backend.
//!
//! # Endpoints
//! - `POST /api/auth/register`, `POST /api/auth/login`
//! - `GET|POST /api/properties`, `GET|PUT|DELETE /api/properties/:id`
//! - `POST /api/properties/:id/recommend`
//! - `GET /api/favorites`, `POST|DELETE /api/favorites/:id`
//! - `GET /api/recommendations`, `PUT /api/recommendations/:id/read`
//! - `GET /health`
//!
//! `PUT /api/properties/:id` answers with the updated property, while
//! `DELETE /api/properties/:id` answers with `{"message": ...}` since there
//! is nothing left to return.

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppState, Backends};
