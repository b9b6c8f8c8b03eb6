//! Batch retrieval with unprocessed-key retries.
//!
//! The storage service may serve only part of a batch read and hand the rest back as
//! unprocessed keys. Each chunk of keys is re-issued until nothing is left, sleeping an
//! exponentially growing, fully jittered delay between rounds, and abandoned once the
//! retry budget is spent.

use std::time::Duration;

use rand::Rng;

use dynorm_core::key::KeyInput;
use dynorm_core::response::BatchResponse;
use dynorm_core::retry::RetryConfig;
use dynorm_core::storage::ConsumedCapacity;
use dynorm_core::value::Item;
use dynorm_core::{Result, StoreError};

use super::Adapter;
use crate::collection::Collection;
use crate::entity::FromRecord;

/// Entities found by a batch read.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFindResult<T> {
    pub entities: Vec<T>,
    /// Always empty on success.
    pub unprocessed_keys: Vec<Item>,
    pub consumed_capacity: Vec<ConsumedCapacity>,
}

impl Adapter {
    /// Reads every record matching `keys`.
    ///
    /// Keys are sent in chunks of `Config::batch_chunk_size`, one chunk after the other.
    /// Entities come back in chunk order, then in the order the service returned them.
    /// Keys that do not exist are simply absent from the result.
    pub async fn batch_find<T: FromRecord>(
        &self,
        name: &str,
        keys: &[KeyInput],
    ) -> Result<BatchFindResult<T>> {
        let collection = self.collection(name).await?;
        let retry = self.config.retry_config();

        let mut accumulated = None;
        for chunk in keys.chunks(self.config.batch_chunk_size.max(1)) {
            accumulated = Some(fetch_chunk(&collection, chunk, accumulated, &retry).await?);
        }

        let response = accumulated.unwrap_or_default();
        let entities = response
            .entities
            .into_iter()
            .map(T::from_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(BatchFindResult {
            entities,
            unprocessed_keys: response.unprocessed_keys,
            consumed_capacity: response.consumed_capacity,
        })
    }
}

/// Runs one chunk to completion, folding every round into `previous`.
async fn fetch_chunk(
    collection: &Collection,
    keys: &[KeyInput],
    previous: Option<BatchResponse>,
    retry: &RetryConfig,
) -> Result<BatchResponse> {
    let mut response = collection.batch_get(keys, previous).await?;
    let mut attempt = 0;

    while !response.is_complete() {
        let remaining = response.unprocessed_keys.len();
        if attempt >= retry.max_retries {
            tracing::warn!(
                collection = %collection.name(),
                attempts = attempt,
                remaining,
                "Giving up on unprocessed keys"
            );
            return Err(StoreError::RetryExhausted {
                attempts: attempt,
                remaining,
            });
        }

        let delay = jittered(retry.backoff_delay(attempt));
        tracing::warn!(
            collection = %collection.name(),
            attempt = attempt + 1,
            remaining,
            ?delay,
            "Retrying unprocessed keys"
        );
        tokio::time::sleep(delay).await;

        let pending = collection.keys_from_items(&response.unprocessed_keys).await?;
        response = collection.batch_get(&pending, Some(response)).await?;
        attempt += 1;
    }

    Ok(response)
}

/// Full jitter: a uniformly random delay between zero and `ceiling`.
fn jittered(ceiling: Duration) -> Duration {
    let ceiling_ms = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
    if ceiling_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ceiling_ms))
}
