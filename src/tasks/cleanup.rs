//! TTL Cleanup Task
//!
//! Background task that periodically purges expired cache entries so stale
//! listing pages do not hold capacity until they are next read.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MemoryCache;

/// Spawns a background task that purges expired entries every `interval`.
///
/// The returned handle is aborted during graceful shutdown.
pub fn spawn_cleanup_task(cache: Arc<MemoryCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "starting cache cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;
            if removed > 0 {
                info!(removed, "cache cleanup removed expired entries");
            } else {
                debug!("cache cleanup found no expired entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = Arc::new(MemoryCache::new(100));
        cache
            .set("expire_soon", "value".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set("long_lived", "value".to_string(), Duration::from_secs(3600))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(
            cache.get("long_lived").await.unwrap(),
            Some("value".to_string())
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(Arc::new(MemoryCache::new(10)), Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
