//! Storage backend implementations.
//!
//! This module provides concrete implementations of the `StorageClient` trait defined in
//! `dynorm_core::storage`. Backends are selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-memory storage service for tests and local development
//! - `dynamodb`: AWS DynamoDB client using `aws-sdk-dynamodb`
//!
//! Both can be enabled together; the adapter only sees `Arc<dyn StorageClient>`.
//!
//! # Examples
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p dynorm --features dynamodb
//! ```

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStorage;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbClient;
