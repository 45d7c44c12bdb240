//! Bounded in-process driver backed by moka.
//!
//! Each entry is charged its payload length in bytes against `max_cost`, and
//! carries its own TTL. Moka's TinyLFU policy decides admission, so a write
//! may be dropped or evicted shortly after it lands: callers must not rely on
//! read-your-writes here.

use super::Driver;
use crate::error::Result;
use ::moka::future::Cache;
use ::moka::Expiry;
use futures::future::join_all;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default cost budget: 64 MiB of payload.
pub const DEFAULT_MAX_COST: u64 = 64 * 1024 * 1024;

/// Configuration for [`MokaDriver`].
#[derive(Clone, Debug)]
pub struct MokaConfig {
    /// Total payload bytes the cache may hold before evicting.
    pub max_cost: u64,
    /// Pre-allocated entry slots.
    pub initial_capacity: Option<usize>,
}

impl Default for MokaConfig {
    fn default() -> Self {
        MokaConfig {
            max_cost: DEFAULT_MAX_COST,
            initial_capacity: None,
        }
    }
}

impl MokaConfig {
    pub fn with_max_cost(mut self, max_cost: u64) -> Self {
        self.max_cost = max_cost;
        self
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> MokaDriver {
        MokaDriver::from_config(self)
    }
}

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Applies the TTL stored in each entry, restarting it on overwrite.
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

fn cost(_key: &String, entry: &Entry) -> u32 {
    u32::try_from(entry.value.len()).unwrap_or(u32::MAX).max(1)
}

/// Bounded, cost-weighted in-process driver.
///
/// Clones share the same underlying cache.
///
/// # Example
///
/// ```no_run
/// use typed_cache::driver::{Driver, MokaDriver};
/// use std::time::Duration;
///
/// # async fn example() -> typed_cache::Result<()> {
/// let driver = MokaDriver::builder().with_max_cost(1 << 20).build();
///
/// driver.set("key", "value", Duration::from_secs(60)).await?;
/// let value = driver.get("key").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MokaDriver {
    cache: Cache<String, Entry>,
}

impl MokaDriver {
    /// Create a driver holding at most `max_cost` payload bytes.
    pub fn new(max_cost: u64) -> Self {
        Self::from_config(MokaConfig::default().with_max_cost(max_cost))
    }

    pub fn builder() -> MokaConfig {
        MokaConfig::default()
    }

    pub fn from_config(config: MokaConfig) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(config.max_cost)
            .weigher(cost)
            .expire_after(EntryTtl);
        if let Some(capacity) = config.initial_capacity {
            builder = builder.initial_capacity(capacity);
        }

        info!("✓ Moka driver initialized (max cost: {} bytes)", config.max_cost);

        MokaDriver {
            cache: builder.build(),
        }
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Approximate total cost of live entries.
    pub fn weighted_size(&self) -> u64 {
        self.cache.weighted_size()
    }

    /// Apply pending admission, eviction and expiration work now.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for MokaDriver {
    fn default() -> Self {
        Self::from_config(MokaConfig::default())
    }
}

impl Driver for MokaDriver {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        debug!("✓ Moka SET {} (TTL: {:?})", key, ttl);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.cache.get(key).await.map(|entry| entry.value);
        if value.is_some() {
            debug!("✓ Moka GET {} -> HIT", key);
        } else {
            debug!("✓ Moka GET {} -> MISS", key);
        }
        Ok(value)
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        debug!("✓ Moka DEL {}", key);
        Ok(())
    }

    async fn multi_set(&self, values: &HashMap<String, String>, ttl: Duration) -> Result<()> {
        join_all(values.iter().map(|(key, value)| self.set(key, value, ttl)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    async fn multi_get(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let values = join_all(keys.iter().map(|key| self.get(key))).await;

        let mut found = HashMap::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            if let Some(value) = value? {
                found.insert(key.to_string(), value);
            }
        }
        Ok(found)
    }

    async fn multi_del(&self, keys: &[&str]) -> Result<()> {
        join_all(keys.iter().map(|key| self.del(key)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }
}
