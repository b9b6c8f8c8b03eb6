use std::time::Duration;

use thiserror::Error;

use crate::coercion::CoercionError;
use crate::key::ValidationError;
use crate::schema::SchemaError;
use crate::storage::StorageError;

/// Every error a data-access operation can surface.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Batch retrieval gave up after {attempts} retries with {remaining} keys unprocessed")]
    RetryExhausted { attempts: u32, remaining: usize },
    #[error("{operation} is not supported by this storage model")]
    Unsupported { operation: &'static str },
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Result type for data-access operations.
pub type Result<T> = std::result::Result<T, StoreError>;
