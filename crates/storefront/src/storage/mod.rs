//! Key/value storage for client-side state.
//!
//! Two kinds of storage back the checkout flow:
//!
//! - **Durable** storage survives restarts and holds the cart
//!   ([`FileStore`], one JSON file per key).
//! - **Session** storage lives only as long as the current browsing session
//!   and carries the buy-now descriptor and the cart-reopen flag between
//!   pages ([`MemoryStore`]).
//!
//! Both implement [`KeyValueStore`]; values are JSON strings.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur when reading or writing stored values.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key contains characters that cannot be used as a storage name.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A string key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing a missing key is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and deserialize a JSON value.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the value is not valid
/// JSON for `T`.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    store
        .get(key)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(StorageError::from)
}

/// Serialize and store a JSON value.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or the store cannot be
/// written.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Keys may only contain ASCII letters, digits, `_` and `-`.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Flag {
        open: bool,
    }

    #[test]
    fn test_json_helpers_roundtrip_through_store() {
        let store = MemoryStore::new();
        write_json(&store, "flag", &Flag { open: true }).unwrap();
        let flag: Option<Flag> = read_json(&store, "flag").unwrap();
        assert_eq!(flag, Some(Flag { open: true }));
    }

    #[test]
    fn test_read_json_missing_key() {
        let store = MemoryStore::new();
        let flag: Option<Flag> = read_json(&store, "flag").unwrap();
        assert!(flag.is_none());
    }

    #[test]
    fn test_read_json_corrupt_value() {
        let store = MemoryStore::new();
        store.set("flag", "{not json").unwrap();
        assert!(matches!(
            read_json::<Flag>(&store, "flag"),
            Err(StorageError::Json(_))
        ));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("buy_now_product").is_ok());
        assert!(validate_key("cart-v2").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a b").is_err());
    }
}
