//! Error types for the typed cache.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the typed cache.
///
/// A missing key is never an error: single-key getters return `Ok(None)`,
/// multi-key getters omit the key and deletes succeed. Every variant below
/// is surfaced to the immediate caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid configuration, reported before any driver call.
    ///
    /// Raised when:
    /// - The default expiration given at construction is zero
    /// - A per-call expiration override is zero
    ConfigError(String),

    /// A value could not be encoded into its string payload.
    ///
    /// Only structured objects can fail to encode, e.g. when a custom
    /// `Serialize` implementation returns an error. Batch writes encode
    /// every value first, so this error means no driver write happened.
    SerializationError(String),

    /// A stored payload does not parse as the requested type.
    ///
    /// The entry is left in the store untouched.
    DecodeError {
        /// Type the caller asked for.
        expected: &'static str,
        /// Parser message.
        reason: String,
    },

    /// Failure reported by the driver (transport, pool, internal).
    ///
    /// Propagated verbatim; the facade performs no retry.
    DriverError(String),
}

impl Error {
    pub(crate) fn decode(expected: &'static str, reason: impl fmt::Display) -> Self {
        Error::DecodeError {
            expected,
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for payload decode failures.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::DecodeError { .. })
    }

    /// Returns `true` for driver failures.
    pub fn is_driver(&self) -> bool {
        matches!(self, Error::DriverError(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DecodeError { expected, reason } => {
                write!(f, "Decode error: expected {}: {}", expected, reason)
            }
            Error::DriverError(msg) => write!(f, "Driver error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(feature = "redis")]
impl From<deadpool_redis::redis::RedisError> for Error {
    fn from(e: deadpool_redis::redis::RedisError) -> Self {
        Error::DriverError(format!("Redis error: {}", e))
    }
}

#[cfg(feature = "redis")]
impl From<deadpool_redis::PoolError> for Error {
    fn from(e: deadpool_redis::PoolError) -> Self {
        Error::DriverError(format!("Failed to get Redis connection: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ConfigError("expiration must be positive".to_string());
        assert_eq!(err.to_string(), "Config error: expiration must be positive");

        let err = Error::decode("bool", "invalid token \"42\"");
        assert_eq!(
            err.to_string(),
            "Decode error: expected bool: invalid token \"42\""
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(Error::decode("i64", "empty").is_decode());
        assert!(!Error::decode("i64", "empty").is_driver());
        assert!(Error::DriverError("connection refused".to_string()).is_driver());
    }

    #[cfg(feature = "redis")]
    #[test]
    fn test_redis_error_becomes_driver_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: Error = deadpool_redis::redis::RedisError::from(io).into();

        assert!(err.is_driver());
        assert!(err.to_string().starts_with("Driver error: Redis error:"));
    }
}
