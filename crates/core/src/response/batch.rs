use crate::storage::ConsumedCapacity;
use crate::value::{Item, Record};

/// Accumulated result of one or more batch-get rounds.
///
/// An empty `unprocessed_keys` means every requested key was served.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResponse {
    pub entities: Vec<Record>,
    pub unprocessed_keys: Vec<Item>,
    pub consumed_capacity: Vec<ConsumedCapacity>,
}

impl BatchResponse {
    /// Folds the next round into this accumulator.
    pub fn merge(mut self, round: BatchResponse) -> BatchResponse {
        self.entities.extend(round.entities);
        self.unprocessed_keys = round.unprocessed_keys;
        self.consumed_capacity = round.consumed_capacity;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.unprocessed_keys.is_empty()
    }
}

/// Merges `round` into `previous` when there is one.
pub fn merge_round(previous: Option<BatchResponse>, round: BatchResponse) -> BatchResponse {
    match previous {
        Some(previous) => previous.merge(round),
        None => round,
    }
}
