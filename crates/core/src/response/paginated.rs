use crate::storage::ConsumedCapacity;
use crate::value::{Item, Record};

/// Accumulated result of one or more query/scan pages.
///
/// `entities` and `count` grow across pages; `last_evaluated_key` and
/// `consumed_capacity` always describe the most recent page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaginatedResponse {
    pub count: usize,
    pub entities: Vec<Record>,
    pub last_evaluated_key: Option<Item>,
    pub consumed_capacity: Vec<ConsumedCapacity>,
}

impl PaginatedResponse {
    /// Folds the next page into this accumulator.
    pub fn merge(mut self, page: PaginatedResponse) -> PaginatedResponse {
        self.count += page.count;
        self.entities.extend(page.entities);
        self.last_evaluated_key = page.last_evaluated_key;
        self.consumed_capacity = page.consumed_capacity;
        self
    }

    /// Returns true if the storage service reported more pages.
    pub fn has_more(&self) -> bool {
        self.last_evaluated_key.as_ref().is_some_and(|k| !k.is_empty())
    }
}

/// Merges `page` into `previous` when there is one.
pub fn merge_page(
    previous: Option<PaginatedResponse>,
    page: PaginatedResponse,
) -> PaginatedResponse {
    match previous {
        Some(previous) => previous.merge(page),
        None => page,
    }
}
