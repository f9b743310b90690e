//! Storage subsystem
//!
//! This module provides the key-value persistence layer and the record
//! collections kept on top of it.
//!
//! Components:
//! - `storage_trait`: the `KeyValueStore` trait every backend implements.
//! - `memory_storage`: process-local backend, used for tests and throwaway runs.
//! - `file_storage`: filesystem-backed backend, one JSON file per key.
//! - `types`: doctor, patient and medical record entities.
//! - `record_store`: whole-collection CRUD over the three entity collections.
//! - `events`: change notifications published on every write.

pub mod events;
pub mod file_storage;
pub mod memory_storage;
pub mod record_store;
pub mod storage_trait;
pub mod types;

pub use events::StoreEvent;
pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
pub use record_store::RecordStore;
pub use storage_trait::KeyValueStore;
