//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of [`StorageClient`] that keeps every
//! table in a `Vec` behind `Arc<RwLock<_>>`. It follows the storage service's paging,
//! key-condition and batch rules closely enough to exercise the data-access layer without
//! a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynorm::storage::inmemory::InMemoryStorage;
//!
//! let storage = InMemoryStorage::new();
//! storage.create_table(TableDescription::new("users", KeySchema::partition("id"))).await;
//! ```
//!
//! [`StorageClient`]: dynorm_core::storage::StorageClient

mod eval;
mod storage;

pub use storage::InMemoryStorage;
