//! Bathroom Now store - storage adapters
//!
//! This crate provides adapter implementations for the storage ports defined
//! in `bathroom-core`: the on-device restroom cache, the remote write store,
//! and the key-value slot holding the anonymous device id.

pub mod device;
pub mod error;
pub mod firestore;
pub mod memory;
pub mod sqlite;

pub use device::{load_or_create_device_id, FileKeyValueStore, DEVICE_ID_KEY};
pub use error::{Result, StoreError};
pub use firestore::FirestoreRestStore;
pub use memory::{MemoryKeyValueStore, MemoryRemoteStore, MemoryToiletCache};
pub use sqlite::SqliteCache;
