//! Functional core of the dynorm data-access layer.
//!
//! Everything here is pure: value marshaling, attribute coercion, key schemas, key
//! validation, response accumulation, cursors and retry pacing. The storage service is
//! only described, through the [`storage::StorageClient`] trait; the `dynorm` crate
//! provides the I/O.

pub mod coercion;
pub mod error;
pub mod key;
pub mod response;
pub mod retry;
pub mod schema;
pub mod storage;
pub mod value;

pub use error::{Result, StoreError};
