//! Collection accessor.
//!
//! A [`Collection`] binds one logical collection to its table and is the only component
//! that talks to the storage client. Every round trip goes through the collection's
//! [`Deadline`].

mod deadline;
mod resolver;
mod serialize;

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use dynorm_core::coercion::CoercerRegistry;
use dynorm_core::key::{dedupe_keys, normalize_key, KeyInput};
use dynorm_core::response::{merge_page, merge_round, BatchResponse, PaginatedResponse};
use dynorm_core::schema::{KeySchema, TableDescription};
use dynorm_core::storage::{PageOutput, QueryOptions, ScanOptions, StorageClient};
use dynorm_core::value::{AttributeValue, Item, Record, Value};
use dynorm_core::{Result, StoreError};

pub use deadline::Deadline;
pub use resolver::KeySchemaResolver;
pub use serialize::{
    deserialize_item, key_values_from_item, serialize_attributes, serialize_item, serialize_key,
    serialize_key_values, serialize_value,
};

/// Data access for one collection.
pub struct Collection {
    name: String,
    table_name: String,
    identity: String,
    registry: CoercerRegistry,
    client: Arc<dyn StorageClient>,
    resolver: KeySchemaResolver,
    deadline: Deadline,
    consistent_reads: bool,
}

impl Collection {
    /// Creates an accessor with no deadline and eventually consistent reads.
    pub fn new(
        name: impl Into<String>,
        table_name: impl Into<String>,
        identity: impl Into<String>,
        registry: CoercerRegistry,
        client: Arc<dyn StorageClient>,
    ) -> Self {
        let table_name = table_name.into();
        Self {
            name: name.into(),
            resolver: KeySchemaResolver::new(
                Arc::clone(&client),
                table_name.clone(),
                Deadline::default(),
            ),
            table_name,
            identity: identity.into(),
            registry,
            client,
            deadline: Deadline::default(),
            consistent_reads: false,
        }
    }

    /// Applies a time limit to every storage call, schema lookups included.
    pub fn with_deadline(mut self, limit: Option<Duration>) -> Self {
        self.deadline = Deadline::new(limit);
        self.resolver = KeySchemaResolver::new(
            Arc::clone(&self.client),
            self.table_name.clone(),
            self.deadline,
        );
        self
    }

    /// Uses strongly consistent reads for `get` and `batch_get`.
    pub fn with_consistent_reads(mut self, consistent_reads: bool) -> Self {
        self.consistent_reads = consistent_reads;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Name of the identity attribute.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn registry(&self) -> &CoercerRegistry {
        &self.registry
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    // ========================================================================
    // Schema
    // ========================================================================

    /// The table description, fetched once.
    pub async fn schema(&self) -> Result<Arc<TableDescription>> {
        self.resolver.description().await
    }

    pub async fn key_schema(&self, index: Option<&str>) -> Result<KeySchema> {
        self.resolver.key_schema(index).await
    }

    /// Returns true if `attribute` belongs to the key of the table or of `index`.
    pub async fn is_key(&self, attribute: &str, index: Option<&str>) -> Result<bool> {
        Ok(self.key_schema(index).await?.contains(attribute))
    }

    /// Coerces and marshals a single attribute value, e.g. for a query condition.
    pub fn serialize_value(&self, attribute: &str, value: &Value) -> Result<AttributeValue> {
        Ok(serialize_value(&self.registry, attribute, value)?)
    }

    // ========================================================================
    // Single-item operations
    // ========================================================================

    /// Writes a new record, generating a UUID identity when none is set.
    ///
    /// The identity is written back into `record` and returned.
    pub async fn create(&self, record: &mut Record) -> Result<Value> {
        let identity = match record.get(&self.identity) {
            Some(value) if !value.is_null() => value.clone(),
            _ => {
                let generated = Value::String(Uuid::new_v4().to_string());
                record.insert(self.identity.clone(), generated.clone());
                generated
            }
        };

        let item = serialize_item(&self.registry, record)?;
        self.deadline
            .run("put_item", self.client.put_item(&self.table_name, item))
            .await?;

        tracing::debug!(table = %self.table_name, ?identity, "Created item");
        Ok(identity)
    }

    /// Writes every non-key attribute of `record`; `Null` attributes are removed.
    pub async fn update(&self, record: &Record) -> Result<()> {
        let schema = self.key_schema(None).await?;
        let key = serialize_key(&self.registry, &schema, record)?;
        let updates = serialize_attributes(&self.registry, &schema, record)?;

        self.deadline
            .run(
                "update_item",
                self.client.update_item(&self.table_name, key, updates),
            )
            .await?;

        tracing::debug!(table = %self.table_name, "Updated item");
        Ok(())
    }

    pub async fn delete(&self, record: &Record) -> Result<()> {
        let schema = self.key_schema(None).await?;
        let key = serialize_key(&self.registry, &schema, record)?;

        self.deadline
            .run("delete_item", self.client.delete_item(&self.table_name, key))
            .await?;

        tracing::debug!(table = %self.table_name, "Deleted item");
        Ok(())
    }

    /// Reads one record by key.
    ///
    /// A key with an empty component or the wrong number of components yields `None`
    /// without reading from storage.
    pub async fn get(&self, key: impl Into<KeyInput>) -> Result<Option<Record>> {
        let schema = self.key_schema(None).await?;
        let values = match normalize_key(&schema, &key.into()) {
            Ok(values) => values,
            Err(error) => {
                tracing::debug!(table = %self.table_name, %error, "Skipping read of invalid key");
                return Ok(None);
            }
        };
        let key = serialize_key_values(&self.registry, &schema, &values)?;

        let item = self
            .deadline
            .run(
                "get_item",
                self.client
                    .get_item(&self.table_name, key, self.consistent_reads),
            )
            .await?;

        item.map(|item| deserialize_item(&self.registry, &item))
            .transpose()
            .map_err(Into::into)
    }

    // ========================================================================
    // Multi-item operations
    // ========================================================================

    /// Reads several records in one round trip and merges them into `previous`.
    ///
    /// Repeated keys are read once. With no keys, or when any key is invalid, nothing is
    /// read and `previous` comes back unchanged.
    pub async fn batch_get(
        &self,
        keys: &[KeyInput],
        previous: Option<BatchResponse>,
    ) -> Result<BatchResponse> {
        if keys.is_empty() {
            return Ok(previous.unwrap_or_default());
        }

        let schema = self.key_schema(None).await?;
        let mut normalized = Vec::with_capacity(keys.len());
        for key in keys {
            match normalize_key(&schema, key) {
                Ok(values) => normalized.push(values),
                Err(error) => {
                    tracing::debug!(
                        table = %self.table_name,
                        %error,
                        "Skipping batch with invalid key"
                    );
                    return Ok(previous.unwrap_or_default());
                }
            }
        }

        let items = normalized
            .iter()
            .map(|values| serialize_key_values(&self.registry, &schema, values))
            .collect::<Result<Vec<_>>>()?;
        let items = dedupe_keys(items);
        let requested = items.len();

        let output = self
            .deadline
            .run(
                "batch_get_item",
                self.client
                    .batch_get_item(&self.table_name, items, self.consistent_reads),
            )
            .await?;

        tracing::debug!(
            table = %self.table_name,
            requested,
            returned = output.items.len(),
            unprocessed = output.unprocessed_keys.len(),
            "Batch read round"
        );

        let round = BatchResponse {
            entities: self.deserialize_items(&output.items)?,
            unprocessed_keys: output.unprocessed_keys,
            consumed_capacity: output.consumed_capacity,
        };
        Ok(merge_round(previous, round))
    }

    /// Reads one query page and merges it into `previous`.
    pub async fn query(
        &self,
        options: QueryOptions,
        previous: Option<PaginatedResponse>,
    ) -> Result<PaginatedResponse> {
        let output = self
            .deadline
            .run("query", self.client.query(&self.table_name, options))
            .await?;
        tracing::debug!(table = %self.table_name, count = output.count, "Query page");

        Ok(merge_page(previous, self.to_page(output)?))
    }

    /// Reads one scan page and merges it into `previous`.
    pub async fn scan(
        &self,
        options: ScanOptions,
        previous: Option<PaginatedResponse>,
    ) -> Result<PaginatedResponse> {
        let output = self
            .deadline
            .run("scan", self.client.scan(&self.table_name, options))
            .await?;
        tracing::debug!(table = %self.table_name, count = output.count, "Scan page");

        Ok(merge_page(previous, self.to_page(output)?))
    }

    /// Turns stored keys (e.g. unprocessed batch keys) back into positional keys.
    pub async fn keys_from_items(&self, items: &[Item]) -> Result<Vec<KeyInput>> {
        let schema = self.key_schema(None).await?;
        items
            .iter()
            .map(|item| {
                key_values_from_item(&self.registry, &schema, item).map(KeyInput::Positional)
            })
            .collect()
    }

    fn deserialize_items(&self, items: &[Item]) -> Result<Vec<Record>> {
        items
            .iter()
            .map(|item| deserialize_item(&self.registry, item).map_err(StoreError::from))
            .collect()
    }

    fn to_page(&self, output: PageOutput) -> Result<PaginatedResponse> {
        Ok(PaginatedResponse {
            count: output.count,
            entities: self.deserialize_items(&output.items)?,
            last_evaluated_key: output.last_evaluated_key,
            consumed_capacity: output.consumed_capacity,
        })
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("table_name", &self.table_name)
            .field("identity", &self.identity)
            .field("deadline", &self.deadline)
            .field("consistent_reads", &self.consistent_reads)
            .finish_non_exhaustive()
    }
}
