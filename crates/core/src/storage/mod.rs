mod error;
mod traits;
mod types;

pub use error::StorageError;
pub use traits::StorageClient;
pub use types::{
    AttributeUpdate, BatchGetOutput, Comparison, Condition, ConsumedCapacity, KeyCondition,
    PageOutput, QueryOptions, ScanOptions, SortCondition,
};
