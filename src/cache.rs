//! Typed cache facade - main entry point for cache operations.

use crate::codec::{self, CacheValue};
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::options::{validate_expiration, CacheOptions, DEFAULT_EXPIRATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Typed cache over a string-valued [`Driver`].
///
/// Encodes values on the way in, decodes them on the way out, and resolves the
/// TTL of every write. The cache holds no entry state of its own: only the
/// driver handle, the default expiration and the metrics hook, all fixed at
/// construction. Concurrency safety is the driver's; the cache takes no locks.
///
/// Every operation has three outcomes:
/// - `Ok(Some(v))` / a map entry - the key is present
/// - `Ok(None)` / an omitted map entry - the key is absent
/// - `Err(e)` - configuration, encode, decode or driver failure
///
/// # Example
///
/// ```ignore
/// use typed_cache::{Cache, driver::InMemoryDriver};
///
/// let cache = Cache::new(InMemoryDriver::new());
///
/// cache.set_int("n", 42).await?;
/// assert_eq!(cache.get_int("n").await?, Some(42));
/// ```
#[derive(Clone)]
pub struct Cache<D: Driver> {
    driver: D,
    expiration: Duration,
    metrics: Arc<dyn CacheMetrics>,
}

impl<D: Driver> Cache<D> {
    /// Create a cache with the default 24 hour expiration.
    pub fn new(driver: D) -> Self {
        Cache {
            driver,
            expiration: DEFAULT_EXPIRATION,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Create a cache with explicit options.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if `options.expiration` is zero.
    pub fn with_options(driver: D, options: CacheOptions) -> Result<Self> {
        let expiration = validate_expiration(options.expiration.unwrap_or(DEFAULT_EXPIRATION))?;
        Ok(Cache {
            driver,
            expiration,
            metrics: Arc::new(NoOpMetrics),
        })
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Default TTL applied to writes without an override.
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    // ------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------

    /// # Errors
    /// Returns `Error::DriverError` if the driver fails.
    pub async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key).await
    }

    /// # Errors
    /// - `Error::DecodeError`: payload is not a boolean token
    /// - `Error::DriverError`: the driver failed
    pub async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.get_value(key).await
    }

    /// # Errors
    /// - `Error::DecodeError`: payload is not an `isize`
    /// - `Error::DriverError`: the driver failed
    pub async fn get_int(&self, key: &str) -> Result<Option<isize>> {
        self.get_value(key).await
    }

    /// # Errors
    /// - `Error::DecodeError`: payload is not an `i64`
    /// - `Error::DriverError`: the driver failed
    pub async fn get_int64(&self, key: &str) -> Result<Option<i64>> {
        self.get_value(key).await
    }

    /// Fetch and decode a structured value.
    ///
    /// # Errors
    /// - `Error::DecodeError`: payload does not decode as `T`
    /// - `Error::DriverError`: the driver failed
    pub async fn get_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.fetch(key).await? {
            Some(payload) => self.decoded(key, codec::decode_object(&payload)).map(Some),
            None => Ok(None),
        }
    }

    /// Decode a structured value into caller-provided storage.
    ///
    /// Returns `Ok(true)` on a hit and `Ok(false)` on a miss. `out` is only
    /// written on a successful hit; a miss or an error leaves it untouched.
    ///
    /// # Errors
    /// Same as [`get_object`](Self::get_object).
    pub async fn get_object_into<T: DeserializeOwned>(
        &self,
        key: &str,
        out: &mut T,
    ) -> Result<bool> {
        match self.get_object(key).await? {
            Some(value) => {
                *out = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fetch several strings. Absent keys are omitted from the result.
    ///
    /// # Errors
    /// Returns `Error::DriverError` if the driver fails.
    pub async fn get_multi_string(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        self.fetch_many(keys).await
    }

    /// Fetch several `isize` values. One malformed payload fails the call.
    ///
    /// # Errors
    /// - `Error::DecodeError`: any payload is not an `isize`
    /// - `Error::DriverError`: the driver failed
    pub async fn get_multi_int(&self, keys: &[&str]) -> Result<HashMap<String, isize>> {
        self.get_multi_value(keys).await
    }

    /// Fetch several `i64` values. One malformed payload fails the call.
    ///
    /// # Errors
    /// - `Error::DecodeError`: any payload is not an `i64`
    /// - `Error::DriverError`: the driver failed
    pub async fn get_multi_int64(&self, keys: &[&str]) -> Result<HashMap<String, i64>> {
        self.get_multi_value(keys).await
    }

    /// Fetch and decode several structured values into fresh `T`s.
    ///
    /// # Errors
    /// - `Error::DecodeError`: any payload does not decode as `T`
    /// - `Error::DriverError`: the driver failed
    pub async fn get_multi_object<T: DeserializeOwned>(
        &self,
        keys: &[&str],
    ) -> Result<HashMap<String, T>> {
        let payloads = self.fetch_many(keys).await?;
        let mut values = HashMap::with_capacity(payloads.len());
        for (key, payload) in payloads {
            let value = self.decoded(&key, codec::decode_object(&payload))?;
            values.insert(key, value);
        }
        Ok(values)
    }

    // ------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------

    /// # Errors
    /// Returns `Error::DriverError` if the driver fails.
    pub async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_string_with(key, value, CacheOptions::default()).await
    }

    /// # Errors
    /// - `Error::ConfigError`: zero expiration override, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_string_with(
        &self,
        key: &str,
        value: &str,
        options: CacheOptions,
    ) -> Result<()> {
        let ttl = options.resolve(self.expiration)?;
        self.store(key, value, ttl).await
    }

    /// # Errors
    /// Returns `Error::DriverError` if the driver fails.
    pub async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_bool_with(key, value, CacheOptions::default()).await
    }

    /// # Errors
    /// - `Error::ConfigError`: zero expiration override, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_bool_with(&self, key: &str, value: bool, options: CacheOptions) -> Result<()> {
        self.set_value(key, &value, options).await
    }

    /// # Errors
    /// Returns `Error::DriverError` if the driver fails.
    pub async fn set_int(&self, key: &str, value: isize) -> Result<()> {
        self.set_int_with(key, value, CacheOptions::default()).await
    }

    /// # Errors
    /// - `Error::ConfigError`: zero expiration override, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_int_with(&self, key: &str, value: isize, options: CacheOptions) -> Result<()> {
        self.set_value(key, &value, options).await
    }

    /// # Errors
    /// Returns `Error::DriverError` if the driver fails.
    pub async fn set_int64(&self, key: &str, value: i64) -> Result<()> {
        self.set_int64_with(key, value, CacheOptions::default()).await
    }

    /// # Errors
    /// - `Error::ConfigError`: zero expiration override, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_int64_with(&self, key: &str, value: i64, options: CacheOptions) -> Result<()> {
        self.set_value(key, &value, options).await
    }

    /// # Errors
    /// - `Error::SerializationError`: `value` failed to serialize, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_object<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set_object_with(key, value, CacheOptions::default()).await
    }

    /// # Errors
    /// - `Error::ConfigError`: zero expiration override, nothing written
    /// - `Error::SerializationError`: `value` failed to serialize, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_object_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: CacheOptions,
    ) -> Result<()> {
        let ttl = options.resolve(self.expiration)?;
        let payload = codec::encode_object(value)?;
        self.store(key, &payload, ttl).await
    }

    /// Write several strings with one driver batch.
    ///
    /// The batch is best-effort: on driver failure some entries may be
    /// written. Nothing is rolled back.
    ///
    /// # Errors
    /// Returns `Error::DriverError` if the driver fails.
    pub async fn set_multi_string(&self, values: &HashMap<String, String>) -> Result<()> {
        self.set_multi_string_with(values, CacheOptions::default())
            .await
    }

    /// # Errors
    /// - `Error::ConfigError`: zero expiration override, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_multi_string_with(
        &self,
        values: &HashMap<String, String>,
        options: CacheOptions,
    ) -> Result<()> {
        let ttl = options.resolve(self.expiration)?;
        self.store_many(values, ttl).await
    }

    /// # Errors
    /// Returns `Error::DriverError` if the driver fails.
    pub async fn set_multi_int(&self, values: &HashMap<String, isize>) -> Result<()> {
        self.set_multi_int_with(values, CacheOptions::default()).await
    }

    /// # Errors
    /// - `Error::ConfigError`: zero expiration override, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_multi_int_with(
        &self,
        values: &HashMap<String, isize>,
        options: CacheOptions,
    ) -> Result<()> {
        self.set_multi_value(values, options).await
    }

    /// # Errors
    /// Returns `Error::DriverError` if the driver fails.
    pub async fn set_multi_int64(&self, values: &HashMap<String, i64>) -> Result<()> {
        self.set_multi_int64_with(values, CacheOptions::default())
            .await
    }

    /// # Errors
    /// - `Error::ConfigError`: zero expiration override, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_multi_int64_with(
        &self,
        values: &HashMap<String, i64>,
        options: CacheOptions,
    ) -> Result<()> {
        self.set_multi_value(values, options).await
    }

    /// Encode every value, then write them with one driver batch.
    ///
    /// # Errors
    /// - `Error::SerializationError`: any value failed to serialize, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_multi_object<T: Serialize>(&self, values: &HashMap<String, T>) -> Result<()> {
        self.set_multi_object_with(values, CacheOptions::default())
            .await
    }

    /// # Errors
    /// - `Error::ConfigError`: zero expiration override, nothing written
    /// - `Error::SerializationError`: any value failed to serialize, nothing written
    /// - `Error::DriverError`: the driver failed
    pub async fn set_multi_object_with<T: Serialize>(
        &self,
        values: &HashMap<String, T>,
        options: CacheOptions,
    ) -> Result<()> {
        let ttl = options.resolve(self.expiration)?;
        let payloads = values
            .iter()
            .map(|(key, value)| Ok((key.clone(), codec::encode_object(value)?)))
            .collect::<Result<HashMap<String, String>>>()?;
        self.store_many(&payloads, ttl).await
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete keys. Absent keys are not errors.
    ///
    /// Zero keys is a no-op, one key uses the driver's single `del`, two or
    /// more use `multi_del`.
    ///
    /// # Errors
    /// Returns `Error::DriverError` if the driver fails.
    pub async fn del(&self, keys: &[&str]) -> Result<()> {
        let timer = Instant::now();
        let result = match keys {
            [] => {
                debug!("Cache DEL with no keys - nothing to do");
                return Ok(());
            }
            [key] => {
                debug!("Cache DEL {} -> single", key);
                self.driver.del(key).await
            }
            _ => {
                debug!("Cache DEL {} keys -> multi", keys.len());
                self.driver.multi_del(keys).await
            }
        };

        match &result {
            Ok(()) => {
                for key in keys {
                    self.metrics.record_delete(key, timer.elapsed());
                }
            }
            Err(e) => self.report_error(keys, e),
        }
        result
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    async fn get_value<T: CacheValue>(&self, key: &str) -> Result<Option<T>> {
        match self.fetch(key).await? {
            Some(payload) => self.decoded(key, T::decode(payload)).map(Some),
            None => Ok(None),
        }
    }

    async fn get_multi_value<T: CacheValue>(&self, keys: &[&str]) -> Result<HashMap<String, T>> {
        let payloads = self.fetch_many(keys).await?;
        let mut values = HashMap::with_capacity(payloads.len());
        for (key, payload) in payloads {
            let value = self.decoded(&key, T::decode(payload))?;
            values.insert(key, value);
        }
        Ok(values)
    }

    async fn set_value<T: CacheValue>(
        &self,
        key: &str,
        value: &T,
        options: CacheOptions,
    ) -> Result<()> {
        let ttl = options.resolve(self.expiration)?;
        self.store(key, &value.encode(), ttl).await
    }

    async fn set_multi_value<T: CacheValue>(
        &self,
        values: &HashMap<String, T>,
        options: CacheOptions,
    ) -> Result<()> {
        let ttl = options.resolve(self.expiration)?;
        let payloads: HashMap<String, String> = values
            .iter()
            .map(|(key, value)| (key.clone(), value.encode()))
            .collect();
        self.store_many(&payloads, ttl).await
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        let timer = Instant::now();
        match self.driver.get(key).await {
            Ok(Some(payload)) => {
                self.metrics.record_hit(key, timer.elapsed());
                Ok(Some(payload))
            }
            Ok(None) => {
                self.metrics.record_miss(key, timer.elapsed());
                Ok(None)
            }
            Err(e) => {
                self.metrics.record_error(key, &e.to_string());
                Err(e)
            }
        }
    }

    async fn fetch_many(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let timer = Instant::now();
        match self.driver.multi_get(keys).await {
            Ok(found) => {
                let elapsed = timer.elapsed();
                for key in keys {
                    if found.contains_key(*key) {
                        self.metrics.record_hit(key, elapsed);
                    } else {
                        self.metrics.record_miss(key, elapsed);
                    }
                }
                Ok(found)
            }
            Err(e) => {
                self.report_error(keys, &e);
                Err(e)
            }
        }
    }

    async fn store(&self, key: &str, payload: &str, ttl: Duration) -> Result<()> {
        let timer = Instant::now();
        match self.driver.set(key, payload, ttl).await {
            Ok(()) => {
                self.metrics.record_set(key, timer.elapsed());
                Ok(())
            }
            Err(e) => {
                self.metrics.record_error(key, &e.to_string());
                Err(e)
            }
        }
    }

    async fn store_many(&self, payloads: &HashMap<String, String>, ttl: Duration) -> Result<()> {
        let timer = Instant::now();
        match self.driver.multi_set(payloads, ttl).await {
            Ok(()) => {
                let elapsed = timer.elapsed();
                for key in payloads.keys() {
                    self.metrics.record_set(key, elapsed);
                }
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                for key in payloads.keys() {
                    self.metrics.record_error(key, &message);
                }
                Err(e)
            }
        }
    }

    fn decoded<T>(&self, key: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.metrics.record_error(key, &e.to_string());
        }
        result
    }

    fn report_error(&self, keys: &[&str], error: &Error) {
        let message = error.to_string();
        for key in keys {
            self.metrics.record_error(key, &message);
        }
    }
}
