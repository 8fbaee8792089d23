//! Cache backends
//!
//! `CacheBackend` is the contract the listing layer consumes. `NoopCache`
//! stands in when caching is disabled so no call site has to branch on
//! "is there a cache".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::CacheStore;
use crate::error::CacheError;

/// Key/value store with expiration holding serialized JSON.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the value for `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Lists keys under `prefix`. Only used for namespace sweeps.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}

// == No-op Backend ==
/// Backend used when caching is disabled: every read misses, every write
/// is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl CacheBackend for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn keys(&self, _prefix: &str) -> Result<Vec<String>, CacheError> {
        Ok(Vec::new())
    }
}

// == In-process Backend ==
/// Shared in-process cache backed by `CacheStore`.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<CacheStore>>,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new(max_entries))),
        }
    }

    /// Drops expired entries; driven by the background cleanup task.
    pub async fn purge_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        // Write lock: reads refresh LRU order and drop expired entries.
        let mut store = self.store.write().await;
        match store.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(CacheError::NotFound(_)) | Err(CacheError::Expired(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.store.write().await.set(key.to_string(), value, ttl)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.write().await.delete(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        Ok(self.store.read().await.keys_with_prefix(prefix))
    }
}
