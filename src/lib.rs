//! # typed-cache
//!
//! A typed facade over pluggable, string-valued key/value cache drivers.
//!
//! ## Features
//!
//! - **Typed access:** strings, booleans, `isize`, `i64` and any `serde` type
//! - **Driver agnostic:** in-memory, bounded in-process (moka) and Redis
//!   drivers, plus your own via the six-operation [`Driver`] trait
//! - **Explicit misses:** an absent key is `Ok(None)`, never an error
//! - **Per-call TTL:** a cache-wide default (24 hours unless configured) that
//!   any write can override
//!
//! ## Quick Start
//!
//! ```ignore
//! use typed_cache::{with_expiration, Cache, driver::InMemoryDriver};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let cache = Cache::new(InMemoryDriver::new());
//!
//! cache.set_int("n", 42).await?;
//! assert_eq!(cache.get_int("n").await?, Some(42));
//!
//! cache.set_bool_with("flag", true, with_expiration(Duration::from_secs(1))).await?;
//!
//! cache.set_object("p", &Person { name: "a".into(), age: 3 }).await?;
//! let person: Option<Person> = cache.get_object("p").await?;
//!
//! cache.del(&["n", "flag"]).await?;
//! ```
//!
//! ## Drivers
//!
//! | Driver | Feature | Notes |
//! |--------|---------|-------|
//! | [`driver::InMemoryDriver`] | `inmemory` (default) | Unbounded, eager TTL |
//! | `driver::MokaDriver` | `moka` (default) | Bounded by payload bytes, TinyLFU admission |
//! | `driver::RedisDriver` | `redis` | Pooled, pipelined batch writes, native `MGET` |

#[macro_use]
extern crate log;

pub mod cache;
pub mod codec;
pub mod driver;
pub mod error;
pub mod observability;
pub mod options;

// Re-exports for convenience
pub use cache::Cache;
pub use codec::CacheValue;
pub use driver::Driver;
pub use error::{Error, Result};
pub use observability::{CacheMetrics, LogMetrics, NoOpMetrics};
pub use options::{with_expiration, CacheOptions, DEFAULT_EXPIRATION};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
