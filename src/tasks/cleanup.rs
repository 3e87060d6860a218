//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from the
//! local store. Expiry is otherwise checked lazily, so without this
//! sweep dead entries would linger until the next read touches them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically sweeps expired entries.
///
/// # Arguments
/// * `cache` - Shared reference to the local store
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the
/// task during graceful shutdown.
pub fn spawn_cleanup_task(
    cache: Arc<RwLock<CacheStore>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_expired()
            };

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = Arc::new(RwLock::new(CacheStore::new(100, 300)));

        {
            let mut cache_guard = cache.write().await;
            cache_guard
                .put("expire_soon".to_string(), b"value".to_vec(), Some(1))
                .unwrap();
        }

        let handle = spawn_cleanup_task(cache.clone(), 1);

        // Wait for the entry to expire and the sweep to run
        tokio::time::sleep(Duration::from_millis(2500)).await;

        {
            let cache_guard = cache.read().await;
            assert_eq!(cache_guard.len(), 0, "Expired entry should be swept");
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = Arc::new(RwLock::new(CacheStore::new(100, 300)));

        {
            let mut cache_guard = cache.write().await;
            cache_guard
                .put("long_lived".to_string(), b"value".to_vec(), Some(3600))
                .unwrap();
        }

        let handle = spawn_cleanup_task(cache.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        {
            let mut cache_guard = cache.write().await;
            let entry = cache_guard.get("long_lived");
            assert!(entry.is_some(), "Valid entry should not be removed");
            assert_eq!(entry.unwrap().value, b"value");
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let cache = Arc::new(RwLock::new(CacheStore::new(100, 300)));

        let handle = spawn_cleanup_task(cache, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
