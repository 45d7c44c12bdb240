//! Driver contract and reference adapters.

use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "inmemory")]
pub mod inmemory;
#[cfg(feature = "moka")]
pub mod moka;
#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "inmemory")]
pub use inmemory::{DriverStats, InMemoryDriver};
#[cfg(feature = "moka")]
pub use self::moka::{MokaConfig, MokaDriver};
#[cfg(feature = "redis")]
pub use self::redis::{PoolStats, RedisConfig, RedisDriver};

/// String-keyed, string-valued store with per-entry TTL.
///
/// Every storage engine plugged into [`Cache`](crate::Cache) implements
/// exactly these six operations. The facade does all typing; a driver only
/// ever sees payload strings.
///
/// **Contract:**
/// - A missing key is `Ok(None)` (or an omitted map entry), never `Err`.
///   `Err` is reserved for transport or internal failures.
/// - A value written by `set` is returned verbatim until it is overwritten,
///   deleted, expired or evicted. An entry whose TTL has elapsed must not be
///   returned.
/// - `del` and `multi_del` are idempotent.
/// - Multi operations are best-effort batches, not transactions. A failure
///   halfway through `multi_set` may leave some entries written.
/// - Multi operations on an empty key set succeed without side effects.
///
/// All methods take `&self`; implementations use interior mutability or an
/// external store and must be safe for concurrent use.
#[allow(async_fn_in_trait)]
pub trait Driver: Send + Sync {
    /// Upsert `key`. The TTL starts at call time.
    ///
    /// # Errors
    /// Returns `Err` if the driver fails to store the entry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Fetch `key`.
    ///
    /// # Returns
    /// - `Ok(Some(value))` - entry present
    /// - `Ok(None)` - no such key (never written, deleted, expired, evicted)
    ///
    /// # Errors
    /// Returns `Err` if the driver fails (connection lost, etc.)
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    /// Returns `Err` if the driver fails
    async fn del(&self, key: &str) -> Result<()>;

    /// Logically a batch of `set`, all with the same TTL.
    ///
    /// # Errors
    /// Returns `Err` if any write fails. Writes already applied stay applied.
    async fn multi_set(&self, values: &HashMap<String, String>, ttl: Duration) -> Result<()>;

    /// Fetch several keys at once.
    ///
    /// The returned map holds exactly the keys that are present; absent keys
    /// are omitted.
    ///
    /// # Errors
    /// Returns `Err` if the driver fails
    async fn multi_get(&self, keys: &[&str]) -> Result<HashMap<String, String>>;

    /// Remove several keys. Absent keys are not errors.
    ///
    /// # Errors
    /// Returns `Err` if the driver fails
    async fn multi_del(&self, keys: &[&str]) -> Result<()>;
}

impl<D: Driver> Driver for Arc<D> {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        (**self).set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn del(&self, key: &str) -> Result<()> {
        (**self).del(key).await
    }

    async fn multi_set(&self, values: &HashMap<String, String>, ttl: Duration) -> Result<()> {
        (**self).multi_set(values, ttl).await
    }

    async fn multi_get(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        (**self).multi_get(keys).await
    }

    async fn multi_del(&self, keys: &[&str]) -> Result<()> {
        (**self).multi_del(keys).await
    }
}
