//! Key-value storage trait
//!
//! This module defines the `KeyValueStore` trait, the interface every storage
//! backend exposes to the record store and the session gate.
//!
//! The contract mirrors a browser's local storage: string keys map to string
//! values, a missing key reads as `None`, and writes replace the whole value.
//! Implementors are responsible for:
//! - Returning the last value written under a key
//! - Replacing a value atomically, so readers never observe a partial write
//! - Treating removal of a missing key as a no-op
//!
//! All methods return a `Result` to handle backend I/O errors.

use crate::error_handling::types::StorageError;

/// The `KeyValueStore` trait defines the interface for string key-value backends.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, `None` when the key was never written.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key` and its value.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
