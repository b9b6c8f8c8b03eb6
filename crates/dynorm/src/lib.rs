//! Collection-oriented data access over DynamoDB.
//!
//! This crate is the imperative shell around `dynorm_core`: it resolves and caches key
//! schemas, drives storage round trips through a [`Collection`], exposes commands and
//! query builders, and retries partially served batch reads from the [`Adapter`].
//!
//! Storage backends live in [`storage`] and are selected with feature flags.

pub mod adapter;
pub mod collection;
pub mod config;
pub mod entity;
pub mod facade;
pub mod storage;
pub mod telemetry;

pub use adapter::{Adapter, BatchFindResult, CollectionDefinition};
pub use collection::Collection;
pub use config::Config;
pub use entity::{Entity, FromRecord};
pub use facade::{Commands, QueryBuilder, ScanBuilder};

pub use dynorm_core::coercion::{Codec, Coercion};
pub use dynorm_core::key::KeyInput;
pub use dynorm_core::response::{BatchResponse, PaginatedResponse};
pub use dynorm_core::storage::{Comparison, SortCondition, StorageClient};
pub use dynorm_core::value::{Record, Value};
pub use dynorm_core::{Result, StoreError};
