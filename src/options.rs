//! Expiration options for construction and per-call writes.

use crate::error::{Error, Result};
use std::time::Duration;

/// Default expiration applied when neither construction nor call sets one.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Options accepted by [`Cache::with_options`](crate::Cache::with_options)
/// and every `set_*_with` method.
///
/// At construction, `expiration` becomes the cache's default TTL. On a write,
/// it overrides that default for the one call.
///
/// # Precedence
///
/// - **If `Some(duration)`**: that duration is the TTL (must be non-zero)
/// - **If `None`**: fall back to the cache default (24 hours unless configured)
///
/// # Example
///
/// ```ignore
/// use typed_cache::{with_expiration, Cache, CacheOptions};
/// use std::time::Duration;
///
/// // One hour default for this cache
/// let options = CacheOptions::default().with_expiration(Duration::from_secs(3600));
/// let cache = Cache::with_options(driver, options)?;
///
/// // Sixty seconds for this write only
/// cache.set_bool_with("flag", true, with_expiration(Duration::from_secs(60))).await?;
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheOptions {
    pub expiration: Option<Duration>,
}

impl CacheOptions {
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// The TTL to use given a fallback default.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if an explicit expiration is zero.
    pub fn resolve(&self, default: Duration) -> Result<Duration> {
        match self.expiration {
            Some(d) => validate_expiration(d),
            None => Ok(default),
        }
    }
}

/// Shorthand for `CacheOptions::default().with_expiration(expiration)`.
pub fn with_expiration(expiration: Duration) -> CacheOptions {
    CacheOptions::default().with_expiration(expiration)
}

pub(crate) fn validate_expiration(expiration: Duration) -> Result<Duration> {
    if expiration.is_zero() {
        return Err(Error::ConfigError(
            "invalid duration: expiration must be strictly positive".to_string(),
        ));
    }
    Ok(expiration)
}
