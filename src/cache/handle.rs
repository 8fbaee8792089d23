//! Cache facade used by the services.
//!
//! Every backend call is bounded by a short timeout and every fault is
//! logged and absorbed: reads degrade to a miss, writes to a no-op.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheBackend, NoopCache};
use crate::error::CacheError;

/// Cloneable, error-absorbing handle over a `CacheBackend`.
#[derive(Clone)]
pub struct CacheHandle {
    backend: Arc<dyn CacheBackend>,
    timeout: Duration,
}

impl CacheHandle {
    pub fn new(backend: Arc<dyn CacheBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Handle over `NoopCache`.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopCache), Duration::from_millis(1))
    }

    // == Get JSON ==
    /// Reads and decodes `key`. Absent, unreachable and undecodable entries
    /// all come back as `None`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.guarded("get", key, self.backend.get(key)).await??;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "discarding undecodable cache entry");
                None
            }
        }
    }

    // == Set JSON ==
    /// Best-effort write; failures are logged only.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, error = %err, "failed to encode cache value");
                return;
            }
        };
        self.guarded("set", key, self.backend.set(key, raw, ttl)).await;
    }

    pub async fn delete(&self, key: &str) {
        self.guarded("delete", key, self.backend.delete(key)).await;
    }

    // == Sweep ==
    /// Deletes every key under `prefix`. Returns the number of keys deleted.
    pub async fn sweep(&self, prefix: &str) -> usize {
        let Some(keys) = self.guarded("keys", prefix, self.backend.keys(prefix)).await else {
            return 0;
        };

        let mut removed = 0;
        for key in &keys {
            if self
                .guarded("delete", key, self.backend.delete(key))
                .await
                .is_some()
            {
                removed += 1;
            }
        }
        debug!(prefix, removed, "swept cache namespace");
        removed
    }

    async fn guarded<T>(
        &self,
        op: &'static str,
        key: &str,
        call: impl Future<Output = Result<T, CacheError>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(err)) => {
                warn!(op, key, error = %err, "cache call failed");
                None
            }
            Err(_) => {
                warn!(op, key, timeout_ms = self.timeout.as_millis() as u64, "cache call timed out");
                None
            }
        }
    }
}
