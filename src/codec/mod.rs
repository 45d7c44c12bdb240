//! Conversions between caller-visible types and driver payloads.
//!
//! Drivers store strings only, so every value crosses this module on its way
//! in and out of the cache.
//!
//! # Formats
//!
//! | Type | Payload |
//! |------|---------|
//! | `bool` | `"true"` / `"false"` |
//! | `isize`, `i64` | decimal text, optional leading `-` |
//! | `String` | identity |
//! | `T: Serialize` | base64(MessagePack with named fields) |
//!
//! Decoding accepts a broader set of boolean tokens
//! (`1 t T TRUE true True` / `0 f F FALSE false False`) so payloads written by
//! other clients of the same store remain readable.
//!
//! Objects use MessagePack because it is self-describing: field names travel
//! with the payload, so any reader can inspect an entry without the Rust type.
//! The MessagePack bytes are carried as padded standard base64 to satisfy the
//! string-only driver contract.
//!
//! # Example
//!
//! ```rust
//! use typed_cache::codec::{decode_object, encode_object};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! # fn main() -> typed_cache::Result<()> {
//! let person = Person { name: "a".to_string(), age: 3 };
//! let payload = encode_object(&person)?;
//! let decoded: Person = decode_object(&payload)?;
//! assert_eq!(person, decoded);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Canonical payload for `true`.
pub const TRUE_PAYLOAD: &str = "true";
/// Canonical payload for `false`.
pub const FALSE_PAYLOAD: &str = "false";

/// A primitive with a canonical string payload.
///
/// Implemented for `bool`, `isize`, `i64` and `String`. The facade's typed
/// getters and setters are thin wrappers over this trait.
pub trait CacheValue: Sized {
    /// Name used in decode errors.
    const TYPE_NAME: &'static str;

    /// Canonical payload for this value. Total.
    fn encode(&self) -> String;

    /// Parse a stored payload. Fails on malformed input.
    fn decode(payload: String) -> Result<Self>;
}

impl CacheValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn encode(&self) -> String {
        encode_bool(*self)
    }

    fn decode(payload: String) -> Result<Self> {
        decode_bool(&payload)
    }
}

impl CacheValue for isize {
    const TYPE_NAME: &'static str = "isize";

    fn encode(&self) -> String {
        encode_int(*self)
    }

    fn decode(payload: String) -> Result<Self> {
        decode_int(&payload)
    }
}

impl CacheValue for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn encode(&self) -> String {
        encode_i64(*self)
    }

    fn decode(payload: String) -> Result<Self> {
        decode_i64(&payload)
    }
}

impl CacheValue for String {
    const TYPE_NAME: &'static str = "string";

    fn encode(&self) -> String {
        self.clone()
    }

    fn decode(payload: String) -> Result<Self> {
        Ok(payload)
    }
}

pub fn encode_bool(value: bool) -> String {
    let token = if value { TRUE_PAYLOAD } else { FALSE_PAYLOAD };
    token.to_string()
}

/// Parse a boolean payload.
///
/// # Errors
///
/// Returns `Error::DecodeError` for any token outside the accepted set.
pub fn decode_bool(payload: &str) -> Result<bool> {
    match payload {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(Error::decode(
            bool::TYPE_NAME,
            format!("invalid boolean token {:?}", other),
        )),
    }
}

pub fn encode_int(value: isize) -> String {
    value.to_string()
}

/// Parse a machine-width integer payload.
///
/// # Errors
///
/// Returns `Error::DecodeError` if the payload is not decimal text or does
/// not fit in `isize`.
pub fn decode_int(payload: &str) -> Result<isize> {
    payload
        .parse::<isize>()
        .map_err(|e| Error::decode(isize::TYPE_NAME, format!("{:?}: {}", payload, e)))
}

pub fn encode_i64(value: i64) -> String {
    value.to_string()
}

/// Parse a 64-bit integer payload.
///
/// # Errors
///
/// Returns `Error::DecodeError` if the payload is not decimal text or does
/// not fit in `i64`.
pub fn decode_i64(payload: &str) -> Result<i64> {
    payload
        .parse::<i64>()
        .map_err(|e| Error::decode(i64::TYPE_NAME, format!("{:?}: {}", payload, e)))
}

/// Encode a structured value into its string payload.
///
/// # Errors
///
/// Returns `Error::SerializationError` if the value's `Serialize`
/// implementation fails.
pub fn encode_object<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let bytes =
        rmp_serde::to_vec_named(value).map_err(|e| Error::SerializationError(e.to_string()))?;
    Ok(STANDARD.encode(bytes))
}

/// Decode a structured value from its string payload.
///
/// # Errors
///
/// Returns `Error::DecodeError` if the payload is not valid base64 or the
/// MessagePack body does not match `T`.
pub fn decode_object<T: DeserializeOwned>(payload: &str) -> Result<T> {
    let expected = std::any::type_name::<T>();
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| Error::decode(expected, format!("invalid envelope: {}", e)))?;
    rmp_serde::from_slice(&bytes).map_err(|e| Error::decode(expected, e))
}
