//! Cached key schema resolution.
//!
//! The table description is fetched once and shared by every index lookup; each resolved
//! key schema is cached by index name. Population is not serialized: two callers racing on
//! an empty cache may both describe the table, and both store the same value.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use dynorm_core::schema::{resolve_key_schema, KeySchema, TableDescription};
use dynorm_core::storage::StorageClient;
use dynorm_core::Result;

use super::Deadline;

pub struct KeySchemaResolver {
    client: Arc<dyn StorageClient>,
    table_name: String,
    deadline: Deadline,
    description: RwLock<Option<Arc<TableDescription>>>,
    key_schemas: RwLock<HashMap<Option<String>, KeySchema>>,
}

impl KeySchemaResolver {
    pub fn new(
        client: Arc<dyn StorageClient>,
        table_name: impl Into<String>,
        deadline: Deadline,
    ) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            deadline,
            description: RwLock::new(None),
            key_schemas: RwLock::new(HashMap::new()),
        }
    }

    /// The table description, fetched on first use.
    pub async fn description(&self) -> Result<Arc<TableDescription>> {
        if let Some(description) = self.description.read().await.as_ref() {
            tracing::trace!(table = %self.table_name, "Table description cache hit");
            return Ok(Arc::clone(description));
        }

        let fetched = self
            .deadline
            .run("describe_table", self.client.describe_table(&self.table_name))
            .await?;
        tracing::debug!(table = %self.table_name, "Described table");

        let fetched = Arc::new(fetched);
        *self.description.write().await = Some(Arc::clone(&fetched));
        Ok(fetched)
    }

    /// Key schema of the table (`None`) or of a secondary index.
    pub async fn key_schema(&self, index: Option<&str>) -> Result<KeySchema> {
        let cache_key = index.map(str::to_string);
        if let Some(schema) = self.key_schemas.read().await.get(&cache_key) {
            tracing::trace!(table = %self.table_name, ?index, "Key schema cache hit");
            return Ok(schema.clone());
        }

        let description = self.description().await?;
        let schema = resolve_key_schema(&description, index)?;

        self.key_schemas
            .write()
            .await
            .insert(cache_key, schema.clone());
        Ok(schema)
    }
}
