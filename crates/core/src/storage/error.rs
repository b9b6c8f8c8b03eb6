use thiserror::Error;

/// A fault reported by the storage service or its transport.
///
/// Passed to callers as-is; this layer never retries single-item operations on it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Throughput exceeded: {0}")]
    Throttled(String),
    #[error("Condition check failed: {0}")]
    ConditionFailed(String),
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Storage service error: {0}")]
    Service(String),
    #[error("Request rejected: {0}")]
    Request(String),
}
