use async_trait::async_trait;

use crate::schema::TableDescription;
use crate::value::Item;

use super::{AttributeUpdate, BatchGetOutput, PageOutput, QueryOptions, ScanOptions, StorageError};

/// The storage service operations the data-access layer drives.
///
/// Implementations own transport, credentials and wire format. Every method is one
/// round trip.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Writes a whole item, replacing any existing one with the same key.
    async fn put_item(&self, table: &str, item: Item) -> Result<(), StorageError>;

    /// Applies per-attribute updates to the item with the given key.
    async fn update_item(
        &self,
        table: &str,
        key: Item,
        updates: Vec<(String, AttributeUpdate)>,
    ) -> Result<(), StorageError>;

    /// Deletes the item with the given key.
    async fn delete_item(&self, table: &str, key: Item) -> Result<(), StorageError>;

    /// Reads the item with the given key.
    async fn get_item(
        &self,
        table: &str,
        key: Item,
        consistent_read: bool,
    ) -> Result<Option<Item>, StorageError>;

    /// Reads several items; keys the service did not get to come back as unprocessed.
    async fn batch_get_item(
        &self,
        table: &str,
        keys: Vec<Item>,
        consistent_read: bool,
    ) -> Result<BatchGetOutput, StorageError>;

    /// Reads one page of a query.
    async fn query(&self, table: &str, options: QueryOptions) -> Result<PageOutput, StorageError>;

    /// Reads one page of a scan.
    async fn scan(&self, table: &str, options: ScanOptions) -> Result<PageOutput, StorageError>;

    /// Describes the key schema and secondary indexes of a table.
    async fn describe_table(&self, table: &str) -> Result<TableDescription, StorageError>;
}
