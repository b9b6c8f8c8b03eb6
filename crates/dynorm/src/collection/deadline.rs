use std::future::Future;
use std::time::Duration;

use dynorm_core::storage::StorageError;
use dynorm_core::{Result, StoreError};

/// Optional per-call time limit applied to storage round trips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    limit: Option<Duration>,
}

impl Deadline {
    pub fn new(limit: Option<Duration>) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// Awaits `call`, failing with `StoreError::Timeout` once the limit elapses.
    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, StorageError>>,
    {
        let Some(after) = self.limit else {
            return Ok(call.await?);
        };

        match tokio::time::timeout(after, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(operation, ?after, "Storage call timed out");
                Err(StoreError::Timeout { operation, after })
            }
        }
    }
}
