//! Unbounded in-memory driver (thread-safe, eager TTL).
//!
//! Uses DashMap for concurrent access with per-key sharding. Expired entries
//! are never returned and are removed when a read touches them.

use super::Driver;
use crate::error::Result;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn new(value: &str, ttl: Duration) -> Self {
        // A TTL too large for the clock means "effectively never".
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(u32::MAX as u64));
        Entry {
            value: value.to_string(),
            expires_at,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Thread-safe in-memory driver.
///
/// Unlike [`MokaDriver`](super::MokaDriver) there is no capacity bound and no
/// admission policy, so a read issued after a successful write always sees
/// it until the TTL elapses. Clones share the same store.
///
/// # Example
///
/// ```no_run
/// use typed_cache::driver::{Driver, InMemoryDriver};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let driver = InMemoryDriver::new();
///
///     driver.set("key1", "value", Duration::from_secs(300)).await?;
///     assert_eq!(driver.get("key1").await?, Some("value".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryDriver {
    store: Arc<DashMap<String, Entry>>,
}

impl InMemoryDriver {
    pub fn new() -> Self {
        InMemoryDriver {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Snapshot of store occupancy.
    pub fn stats(&self) -> DriverStats {
        let mut stats = DriverStats {
            total_entries: 0,
            expired_entries: 0,
            total_bytes: 0,
        };
        for entry in self.store.iter() {
            stats.total_entries += 1;
            stats.total_bytes += entry.value.len();
            if entry.is_expired() {
                stats.expired_entries += 1;
            }
        }
        stats
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.store.clear();
        warn!("⚠ InMemory CLEAR executed - all entries dropped!");
    }

    fn read(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                return Some(entry.value.clone());
            }
        }
        // Reclaim only if still expired; a concurrent writer may have replaced it.
        self.store.remove_if(key, |_, entry| entry.is_expired());
        None
    }
}

impl Driver for InMemoryDriver {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.store.insert(key.to_string(), Entry::new(value, ttl));
        debug!("✓ InMemory SET {} (TTL: {:?})", key, ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.read(key);
        if value.is_some() {
            debug!("✓ InMemory GET {} -> HIT", key);
        } else {
            debug!("✓ InMemory GET {} -> MISS", key);
        }
        Ok(value)
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DEL {}", key);
        Ok(())
    }

    async fn multi_set(&self, values: &HashMap<String, String>, ttl: Duration) -> Result<()> {
        for (key, value) in values {
            self.store.insert(key.clone(), Entry::new(value, ttl));
        }
        debug!("✓ InMemory MSET {} keys (TTL: {:?})", values.len(), ttl);
        Ok(())
    }

    async fn multi_get(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let found: HashMap<String, String> = keys
            .iter()
            .filter_map(|k| self.read(k).map(|v| (k.to_string(), v)))
            .collect();
        debug!("✓ InMemory MGET {} keys -> {} hits", keys.len(), found.len());
        Ok(found)
    }

    async fn multi_del(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.store.remove(*key);
        }
        debug!("✓ InMemory MDEL {} keys", keys.len());
        Ok(())
    }
}

/// Store occupancy snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_inmemory_driver_set_get() {
        let driver = InMemoryDriver::new();

        driver.set("key1", "value1", TTL).await.expect("Failed to set");

        let result = driver.get("key1").await.expect("Failed to get");
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_inmemory_driver_miss() {
        let driver = InMemoryDriver::new();

        let result = driver.get("nonexistent").await.expect("Failed to get");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_inmemory_driver_overwrite() {
        let driver = InMemoryDriver::new();

        driver.set("key1", "old", TTL).await.expect("Failed to set");
        driver.set("key1", "new", TTL).await.expect("Failed to set");

        assert_eq!(
            driver.get("key1").await.expect("Failed to get"),
            Some("new".to_string())
        );
        assert_eq!(driver.len(), 1);
    }

    #[tokio::test]
    async fn test_inmemory_driver_del_idempotent() {
        let driver = InMemoryDriver::new();

        driver.set("key1", "value1", TTL).await.expect("Failed to set");
        driver.del("key1").await.expect("Failed to delete");
        driver.del("key1").await.expect("Second delete should succeed");

        assert_eq!(driver.get("key1").await.expect("Failed to get"), None);
    }

    #[tokio::test]
    async fn test_inmemory_driver_ttl_expiration() {
        let driver = InMemoryDriver::new();

        driver
            .set("key1", "value1", Duration::from_millis(100))
            .await
            .expect("Failed to set");

        assert!(driver.get("key1").await.expect("Failed to get").is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(driver.get("key1").await.expect("Failed to get").is_none());
        // The expired entry was reclaimed by the read.
        assert!(driver.is_empty());
    }

    #[tokio::test]
    async fn test_inmemory_driver_multi_set_get() {
        let driver = InMemoryDriver::new();

        let values: HashMap<String, String> = [("key1", "value1"), ("key2", "value2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        driver.multi_set(&values, TTL).await.expect("Failed to mset");

        let results = driver
            .multi_get(&["key1", "key2", "key3"])
            .await
            .expect("Failed to mget");

        assert_eq!(results, values);
    }

    #[tokio::test]
    async fn test_inmemory_driver_multi_get_skips_expired() {
        let driver = InMemoryDriver::new();

        driver
            .set("short", "gone", Duration::from_millis(50))
            .await
            .expect("Failed to set");
        driver.set("long", "kept", TTL).await.expect("Failed to set");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let results = driver
            .multi_get(&["short", "long"])
            .await
            .expect("Failed to mget");
        assert_eq!(results.len(), 1);
        assert_eq!(results.get("long"), Some(&"kept".to_string()));
    }

    #[tokio::test]
    async fn test_inmemory_driver_multi_del() {
        let driver = InMemoryDriver::new();

        for key in ["key1", "key2", "key3"] {
            driver.set(key, "value", TTL).await.expect("Failed to set");
        }
        assert_eq!(driver.len(), 3);

        driver
            .multi_del(&["key1", "key2", "missing"])
            .await
            .expect("Failed to mdel");

        assert_eq!(driver.len(), 1);
        assert!(driver.get("key3").await.expect("Failed to get").is_some());
    }

    #[tokio::test]
    async fn test_inmemory_driver_empty_batches() {
        let driver = InMemoryDriver::new();

        driver
            .multi_set(&HashMap::new(), TTL)
            .await
            .expect("Empty mset should succeed");
        assert!(driver
            .multi_get(&[])
            .await
            .expect("Empty mget should succeed")
            .is_empty());
        driver.multi_del(&[]).await.expect("Empty mdel should succeed");
    }

    #[tokio::test]
    async fn test_inmemory_driver_clear() {
        let driver = InMemoryDriver::new();

        driver.set("key1", "value1", TTL).await.expect("Failed to set");
        driver.set("key2", "value2", TTL).await.expect("Failed to set");
        assert_eq!(driver.len(), 2);

        driver.clear();

        assert!(driver.is_empty());
    }

    #[tokio::test]
    async fn test_inmemory_driver_stats() {
        let driver = InMemoryDriver::new();

        driver
            .set("key1", "value_with_data", TTL)
            .await
            .expect("Failed to set");
        driver.set("key2", "data", TTL).await.expect("Failed to set");

        let stats = driver.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 0);
        assert_eq!(stats.total_bytes, "value_with_data".len() + "data".len());
    }

    #[tokio::test]
    async fn test_inmemory_driver_clone_shares_store() {
        let driver1 = InMemoryDriver::new();
        driver1.set("key", "value", TTL).await.expect("Failed to set");

        let driver2 = driver1.clone();

        assert_eq!(
            driver2.get("key").await.expect("Failed to get"),
            Some("value".to_string())
        );
    }

    #[tokio::test]
    async fn test_inmemory_driver_thread_safe() {
        let driver = InMemoryDriver::new();
        let mut handles = vec![];

        for i in 0..10 {
            let d = driver.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key_{}", i);
                let value = format!("value_{}", i);
                d.set(&key, &value, TTL).await.expect("Failed to set");
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(driver.len(), 10);
    }
}
