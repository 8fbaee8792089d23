//! Configuration Module
//!
//! Loads server configuration from environment variables. A `.env` file in
//! the working directory is read first when present.

use std::env;
use std::str::FromStr;

/// Signing secret used when `JWT_SECRET` is unset. Only fit for local runs.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// `false` swaps the cache for a no-op backend
    pub cache_enabled: bool,
    /// Maximum number of entries the in-process cache holds
    pub cache_max_entries: usize,
    /// Listing page TTL in seconds
    pub list_cache_ttl: u64,
    /// Single-property entry TTL in seconds
    pub item_cache_ttl: u64,
    pub cache_timeout_ms: u64,
    pub db_timeout_ms: u64,
    /// Expired-entry purge interval in seconds
    pub cleanup_interval: u64,
    /// Upper bound for `limit` on listing queries
    pub max_page_size: u32,
    pub jwt_secret: String,
    /// Bearer token lifetime in seconds
    pub token_ttl: u64,
    /// MongoDB connection string; documents stay in memory when unset
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    /// Redis URL; the in-process cache is used when unset or unreachable
    pub redis_url: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` (default: 8080)
    /// - `CACHE_ENABLED` (default: true)
    /// - `CACHE_MAX_ENTRIES` (default: 10000)
    /// - `LIST_CACHE_TTL`, `ITEM_CACHE_TTL` in seconds (default: 3600)
    /// - `CACHE_TIMEOUT_MS` (default: 250)
    /// - `DB_TIMEOUT_MS` (default: 5000)
    /// - `CLEANUP_INTERVAL` in seconds (default: 60)
    /// - `MAX_PAGE_SIZE` (default: 100)
    /// - `JWT_SECRET` (default: a development secret)
    /// - `TOKEN_TTL` in seconds (default: 600)
    /// - `MONGODB_URI` (default: unset, in-memory documents)
    /// - `MONGODB_DATABASE` (default: property_listing)
    /// - `REDIS_URL` (default: unset, in-process cache)
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Self {
            server_port: parsed("SERVER_PORT", defaults.server_port),
            cache_enabled: env::var("CACHE_ENABLED")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.cache_enabled),
            cache_max_entries: parsed("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            list_cache_ttl: parsed("LIST_CACHE_TTL", defaults.list_cache_ttl),
            item_cache_ttl: parsed("ITEM_CACHE_TTL", defaults.item_cache_ttl),
            cache_timeout_ms: parsed("CACHE_TIMEOUT_MS", defaults.cache_timeout_ms),
            db_timeout_ms: parsed("DB_TIMEOUT_MS", defaults.db_timeout_ms),
            cleanup_interval: parsed("CLEANUP_INTERVAL", defaults.cleanup_interval),
            max_page_size: parsed("MAX_PAGE_SIZE", defaults.max_page_size).max(1),
            jwt_secret: non_empty("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_ttl: parsed("TOKEN_TTL", defaults.token_ttl),
            mongodb_uri: non_empty("MONGODB_URI"),
            mongodb_database: non_empty("MONGODB_DATABASE").unwrap_or(defaults.mongodb_database),
            redis_url: non_empty("REDIS_URL"),
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            cache_enabled: true,
            cache_max_entries: 10_000,
            list_cache_ttl: 3600,
            item_cache_ttl: 3600,
            cache_timeout_ms: 250,
            db_timeout_ms: 5000,
            cleanup_interval: 60,
            max_page_size: 100,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: 600,
            mongodb_uri: None,
            mongodb_database: "property_listing".to_string(),
            redis_url: None,
        }
    }
}

fn parsed<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
