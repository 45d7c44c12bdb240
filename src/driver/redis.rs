//! Redis driver implementation.

use super::Driver;
use crate::error::{Error, Result};
use deadpool_redis::redis::{self as redis_client, AsyncCommands};
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use std::collections::HashMap;
use std::time::Duration;

/// Pool statistics information.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Default Redis connection pool size.
/// Formula: (CPU cores × 2) + 1
/// For 8-core systems: 16 connections is optimal
const DEFAULT_POOL_SIZE: u32 = 16;

/// Configuration for Redis driver.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: u32,
    pub pool_size: u32,
    /// How long a call waits for a pooled connection.
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            host: "localhost".to_string(),
            port: 6379,
            username: None,
            password: None,
            database: 0,
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Build Redis connection string.
    pub fn connection_string(&self) -> String {
        if let Some(password) = &self.password {
            if let Some(username) = &self.username {
                format!(
                    "redis://{}:{}@{}:{}/{}",
                    username, password, self.host, self.port, self.database
                )
            } else {
                format!(
                    "redis://default:{}@{}:{}/{}",
                    password, self.host, self.port, self.database
                )
            }
        } else {
            format!("redis://{}:{}/{}", self.host, self.port, self.database)
        }
    }
}

/// Largest `PSETEX` argument Redis accepts once it adds the current time.
const MAX_TTL_MILLIS: u64 = (i64::MAX / 2) as u64;

/// Redis TTLs are set with millisecond precision, between 1 ms and
/// [`MAX_TTL_MILLIS`].
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis())
        .unwrap_or(u64::MAX)
        .clamp(1, MAX_TTL_MILLIS)
}

/// Redis driver with connection pooling.
///
/// Single writes use `PSETEX`, batched writes pipeline one `PSETEX` per
/// entry, batched reads use native `MGET`. A nil reply means "absent".
///
/// # Example
///
/// ```no_run
/// # use typed_cache::driver::{Driver, RedisDriver, RedisConfig};
/// # use std::time::Duration;
/// # async fn example() -> typed_cache::Result<()> {
/// let driver = RedisDriver::new(RedisConfig::default()).await?;
///
/// driver.set("key", "value", Duration::from_secs(60)).await?;
/// let value = driver.get("key").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisDriver {
    pool: Pool,
}

impl RedisDriver {
    /// Create a new Redis driver from configuration.
    ///
    /// # Errors
    /// Returns `Err` if pool creation fails.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let mut cfg = PoolConfig::from_url(config.connection_string());
        let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size as usize);
        pool_config.timeouts.wait = Some(config.connection_timeout);
        pool_config.timeouts.create = Some(config.connection_timeout);
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::DriverError(format!("Failed to create Redis pool: {}", e)))?;

        info!("✓ Redis driver initialized: {}:{}", config.host, config.port);

        Ok(RedisDriver { pool })
    }

    /// Create from a connection string with the default pool size.
    ///
    /// # Errors
    /// Returns `Err` if pool creation fails.
    pub async fn from_connection_string(conn_str: &str) -> Result<Self> {
        let mut cfg = PoolConfig::from_url(conn_str);
        cfg.pool = Some(deadpool_redis::PoolConfig::new(DEFAULT_POOL_SIZE as usize));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::DriverError(format!("Failed to create Redis pool: {}", e)))?;

        info!(
            "✓ Redis driver initialized from connection string (pool size: {})",
            DEFAULT_POOL_SIZE
        );

        Ok(RedisDriver { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: Pool) -> Self {
        RedisDriver { pool }
    }

    /// Get current pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            connections: status.size as u32,
            idle_connections: status.available as u32,
        }
    }

    /// Health check - `PING` the server.
    ///
    /// # Errors
    /// Returns `Err` if no connection can be obtained or the command fails.
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;

        let pong: String = redis_client::cmd("PING").query_async(&mut *conn).await?;

        Ok(pong.contains("PONG"))
    }

    async fn connection(&self) -> Result<Connection> {
        Ok(self.pool.get().await?)
    }
}

impl Driver for RedisDriver {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;

        let millis = ttl_millis(ttl);
        conn.pset_ex::<_, _, ()>(key, value, millis)
            .await
            .map_err(|e| {
                Error::DriverError(format!("Redis PSETEX failed for key {}: {}", key, e))
            })?;

        debug!("✓ Redis SET {} (TTL: {}ms)", key, millis);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;

        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| Error::DriverError(format!("Redis GET failed for key {}: {}", key, e)))?;

        if value.is_some() {
            debug!("✓ Redis GET {} -> HIT", key);
        } else {
            debug!("✓ Redis GET {} -> MISS", key);
        }

        Ok(value)
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;

        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::DriverError(format!("Redis DEL failed for key {}: {}", key, e)))?;

        debug!("✓ Redis DEL {}", key);
        Ok(())
    }

    async fn multi_set(&self, values: &HashMap<String, String>, ttl: Duration) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;

        let millis = ttl_millis(ttl);
        let mut pipe = redis_client::pipe();
        for (key, value) in values {
            pipe.pset_ex(key, value, millis).ignore();
        }
        pipe.query_async::<()>(&mut *conn).await?;

        debug!("✓ Redis MSET {} keys (TTL: {}ms)", values.len(), millis);
        Ok(())
    }

    async fn multi_get(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.connection().await?;

        // Explicit MGET: a single key would otherwise be sent as GET.
        let values: Vec<Option<String>> = redis_client::cmd("MGET")
            .arg(keys)
            .query_async(&mut *conn)
            .await?;

        let found: HashMap<String, String> = keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .collect();

        debug!("✓ Redis MGET {} keys -> {} hits", keys.len(), found.len());
        Ok(found)
    }

    async fn multi_del(&self, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;

        conn.del::<_, ()>(keys).await?;

        debug!("✓ Redis MDEL {} keys", keys.len());
        Ok(())
    }
}
