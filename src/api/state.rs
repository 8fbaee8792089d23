//! Shared application state and the backends it is assembled from.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::accounts::AccountService;
use crate::auth::{BcryptHasher, JwtTokens, PasswordHasher, TokenService};
use crate::cache::{CacheBackend, CacheHandle, MemoryCache, RedisCache};
use crate::config::Config;
use crate::favorites::FavoriteService;
use crate::listing::{CachePolicy, ListingService};
use crate::recommendations::RecommendationService;
use crate::store::{MemoryStore, MongoStore, StoreError, Stores};

/// Concrete collaborators, built once at startup and injected into the
/// services. Fields are public so tests can swap individual pieces.
pub struct Backends {
    pub stores: Stores,
    /// `None` when caching is disabled
    pub cache: Option<Arc<dyn CacheBackend>>,
    /// Set when `cache` is the in-process backend, which needs purging
    pub local_cache: Option<Arc<MemoryCache>>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenService>,
}

impl Backends {
    /// In-process store and cache configured from `config`.
    pub fn in_memory(config: &Config) -> Self {
        Self::assemble(config, Stores::shared(Arc::new(MemoryStore::new())), None)
    }

    /// Backends named by `config`.
    ///
    /// With `MONGODB_URI` set the documents live in MongoDB and a failed
    /// connection is an error. With `REDIS_URL` set the cache lives in Redis;
    /// an unreachable Redis falls back to the in-process cache.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let stores = match &config.mongodb_uri {
            Some(uri) => {
                Stores::shared(Arc::new(MongoStore::connect(uri, &config.mongodb_database).await?))
            }
            None => {
                warn!("MONGODB_URI is not set; documents are kept in memory");
                Stores::shared(Arc::new(MemoryStore::new()))
            }
        };

        let remote_cache = match &config.redis_url {
            Some(url) if config.cache_enabled => match RedisCache::connect(url).await {
                Ok(cache) => Some(Arc::new(cache) as Arc<dyn CacheBackend>),
                Err(err) => {
                    warn!(error = %err, "Redis unreachable; caching in process instead");
                    None
                }
            },
            _ => None,
        };

        let backends = Self::assemble(config, stores, remote_cache);
        if backends.local_cache.is_some() {
            info!(max_entries = config.cache_max_entries, "caching in process");
        }
        Ok(backends)
    }

    fn assemble(
        config: &Config,
        stores: Stores,
        remote_cache: Option<Arc<dyn CacheBackend>>,
    ) -> Self {
        let local_cache = (config.cache_enabled && remote_cache.is_none())
            .then(|| Arc::new(MemoryCache::new(config.cache_max_entries)));
        let cache = remote_cache.or_else(|| {
            local_cache
                .clone()
                .map(|cache| cache as Arc<dyn CacheBackend>)
        });
        Self {
            stores,
            cache,
            local_cache,
            hasher: Arc::new(BcryptHasher::default()),
            tokens: Arc::new(JwtTokens::new(
                &config.jwt_secret,
                Duration::from_secs(config.token_ttl),
            )),
        }
    }

    fn cache_handle(&self, config: &Config) -> CacheHandle {
        match &self.cache {
            Some(cache) => CacheHandle::new(
                cache.clone(),
                Duration::from_millis(config.cache_timeout_ms),
            ),
            None => CacheHandle::disabled(),
        }
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub listings: ListingService,
    pub accounts: AccountService,
    pub favorites: FavoriteService,
    pub recommendations: RecommendationService,
    pub tokens: Arc<dyn TokenService>,
    pub max_page_size: u32,
    pub cache_enabled: bool,
}

impl AppState {
    pub fn new(config: &Config, backends: &Backends) -> Self {
        let store_timeout = Duration::from_millis(config.db_timeout_ms);
        let stores = &backends.stores;

        Self {
            listings: ListingService::new(
                stores.properties.clone(),
                backends.cache_handle(config),
                CachePolicy::from_config(config),
            ),
            accounts: AccountService::new(
                stores.users.clone(),
                backends.hasher.clone(),
                backends.tokens.clone(),
                store_timeout,
            ),
            favorites: FavoriteService::new(
                stores.favorites.clone(),
                stores.properties.clone(),
                store_timeout,
            ),
            recommendations: RecommendationService::new(
                stores.recommendations.clone(),
                stores.properties.clone(),
                stores.users.clone(),
                store_timeout,
            ),
            tokens: backends.tokens.clone(),
            max_page_size: config.max_page_size,
            cache_enabled: backends.cache.is_some(),
        }
    }

    /// State over fresh in-memory backends.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config, &Backends::in_memory(config))
    }
}
