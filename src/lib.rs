//! Property listing backend
//!
//! REST service for property listings with accounts, favorites and peer
//! recommendations. Listing reads go through a read-through cache that is
//! invalidated on every successful write.

pub mod accounts;
pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod favorites;
pub mod listing;
pub mod models;
pub mod recommendations;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState, Backends};
pub use config::Config;
pub use tasks::spawn_cleanup_task;
