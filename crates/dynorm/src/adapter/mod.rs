//! Top-level entry point.
//!
//! The [`Adapter`] owns the storage client, the configuration and every collection
//! definition. Collections are built on first access by name and shared afterwards, so
//! their schema caches live as long as the adapter.

mod batch;
mod definition;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use dynorm_core::key::KeyInput;
use dynorm_core::schema::SchemaError;
use dynorm_core::storage::{ScanOptions, StorageClient};
use dynorm_core::value::Value;
use dynorm_core::{Result, StoreError};

use crate::collection::Collection;
use crate::config::Config;
use crate::entity::{Entity, FromRecord};
use crate::facade::{Commands, QueryBuilder, ScanBuilder};

pub use batch::BatchFindResult;
pub use definition::CollectionDefinition;

pub struct Adapter {
    client: Arc<dyn StorageClient>,
    config: Config,
    definitions: HashMap<String, CollectionDefinition>,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl Adapter {
    pub fn new(client: Arc<dyn StorageClient>, config: Config) -> Self {
        Self {
            client,
            config,
            definitions: HashMap::new(),
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a collection definition; invalid or repeated definitions are rejected.
    pub fn register(mut self, definition: CollectionDefinition) -> Result<Self> {
        definition.registry()?;
        if self.definitions.contains_key(&definition.name) {
            return Err(SchemaError::InvalidDefinition(format!(
                "collection '{}' is registered twice",
                definition.name
            ))
            .into());
        }

        self.definitions.insert(definition.name.clone(), definition);
        Ok(self)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The accessor for `name`, created on first use.
    pub async fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        if let Some(collection) = self.collections.read().await.get(name) {
            return Ok(Arc::clone(collection));
        }

        let definition = self
            .definitions
            .get(name)
            .ok_or_else(|| SchemaError::UnknownCollection(name.to_string()))?;
        let table_name = definition
            .table_name
            .clone()
            .unwrap_or_else(|| self.config.table_name(&definition.name));

        let collection = Collection::new(
            definition.name.clone(),
            table_name,
            definition.identity.clone(),
            definition.registry()?,
            Arc::clone(&self.client),
        )
        .with_deadline(self.config.operation_timeout())
        .with_consistent_reads(self.config.consistent_reads);
        tracing::debug!(collection = %name, table = %collection.table_name(), "Opened collection");

        let mut collections = self.collections.write().await;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(collection));
        Ok(Arc::clone(collection))
    }

    pub async fn commands(&self, name: &str) -> Result<Commands> {
        Ok(Commands::new(self.collection(name).await?))
    }

    /// Persists a new entity; returns the identity, which is also set on the entity.
    pub async fn create<E: Entity>(&self, name: &str, entity: &mut E) -> Result<Value> {
        self.commands(name).await?.create_one(entity).await
    }

    pub async fn update<E: Entity>(&self, name: &str, entity: &E) -> Result<()> {
        self.commands(name).await?.update_one(entity).await
    }

    pub async fn delete<E: Entity>(&self, name: &str, entity: &E) -> Result<()> {
        self.commands(name).await?.delete_one(entity).await
    }

    pub async fn find<T: FromRecord>(
        &self,
        name: &str,
        key: impl Into<KeyInput>,
    ) -> Result<Option<T>> {
        self.commands(name).await?.get_one(key).await
    }

    pub async fn query(&self, name: &str) -> Result<QueryBuilder> {
        Ok(QueryBuilder::new(self.collection(name).await?))
    }

    pub async fn scan(&self, name: &str) -> Result<ScanBuilder> {
        Ok(ScanBuilder::new(self.collection(name).await?))
    }

    /// Deletes every item of the collection, one page of keys at a time.
    ///
    /// Returns the number of items deleted.
    pub async fn clear(&self, name: &str) -> Result<usize> {
        let collection = self.collection(name).await?;
        let projection: Vec<String> = collection
            .key_schema(None)
            .await?
            .attribute_names()
            .map(str::to_string)
            .collect();

        let mut deleted = 0;
        let mut start = None;
        loop {
            let options = ScanOptions {
                exclusive_start_key: start,
                consistent_read: true,
                projection: projection.clone(),
                ..ScanOptions::default()
            };
            let page = collection.scan(options, None).await?;

            for key in &page.entities {
                collection.delete(key).await?;
                deleted += 1;
            }

            if !page.has_more() {
                break;
            }
            start = page.last_evaluated_key;
        }

        tracing::info!(collection = %name, deleted, "Cleared collection");
        Ok(deleted)
    }

    /// Not supported: the storage service has no notion of insertion order.
    pub async fn first<T: FromRecord>(&self, name: &str) -> Result<Option<T>> {
        self.collection(name).await?;
        Err(StoreError::Unsupported { operation: "first" })
    }

    /// Not supported: the storage service has no notion of insertion order.
    pub async fn last<T: FromRecord>(&self, name: &str) -> Result<Option<T>> {
        self.collection(name).await?;
        Err(StoreError::Unsupported { operation: "last" })
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("config", &self.config)
            .field("collections", &self.definitions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use std::collections::HashMap;

    use dynorm_core::coercion::Coercion;
    use dynorm_core::schema::{KeySchema, TableDescription};
    use dynorm_core::value::Record;

    use super::*;
    use crate::storage::inmemory::InMemoryStorage;

    pub(super) fn test_config() -> Config {
        let vars = HashMap::from([
            ("DYNORM_TABLE_PREFIX", "test_"),
            ("DYNORM_BATCH_INITIAL_BACKOFF_MS", "0"),
            ("DYNORM_BATCH_MAX_RETRIES", "3"),
        ]);
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    pub(super) fn users() -> CollectionDefinition {
        CollectionDefinition::new("users", "id")
            .attribute("id", Coercion::String)
            .attribute("name", Coercion::String)
            .attribute("active", Coercion::Boolean)
    }

    pub(super) async fn setup(storage: InMemoryStorage) -> (Arc<InMemoryStorage>, Adapter) {
        let storage = Arc::new(storage);
        storage
            .create_table(TableDescription::new("test_users", KeySchema::partition("id")))
            .await;
        let adapter = Adapter::new(storage.clone(), test_config())
            .register(users())
            .unwrap();
        (storage, adapter)
    }

    fn user(name: &str) -> Record {
        Record::from([
            ("name".to_string(), Value::from(name)),
            ("active".to_string(), Value::Bool(true)),
        ])
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (_storage, adapter) = setup(InMemoryStorage::new()).await;

        let mut ada = user("Ada");
        let id = adapter.create("users", &mut ada).await.unwrap();
        assert_eq!(ada.get("id"), Some(&id));

        let found: Option<Record> = adapter.find("users", id.clone()).await.unwrap();
        assert_eq!(found, Some(ada));
    }

    #[tokio::test]
    async fn test_collection_is_cached() {
        let (storage, adapter) = setup(InMemoryStorage::new()).await;

        let first = adapter.collection("users").await.unwrap();
        let second = adapter.collection("users").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.table_name(), "test_users");

        adapter.find::<Record>("users", "a").await.unwrap();
        adapter.find::<Record>("users", "b").await.unwrap();
        assert_eq!(storage.calls("describe_table").await, 1);
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let (_storage, adapter) = setup(InMemoryStorage::new()).await;

        let result = adapter.find::<Record>("orders", "o-1").await;
        assert_eq!(
            result,
            Err(StoreError::Schema(SchemaError::UnknownCollection(
                "orders".to_string()
            )))
        );
    }

    #[tokio::test]
    async fn test_register_twice_rejected() {
        let storage = Arc::new(InMemoryStorage::new());
        let result = Adapter::new(storage, test_config())
            .register(users())
            .unwrap()
            .register(users());

        assert!(matches!(
            result,
            Err(StoreError::Schema(SchemaError::InvalidDefinition(_)))
        ));
    }

    #[tokio::test]
    async fn test_explicit_table_name() {
        let storage = Arc::new(InMemoryStorage::new());
        let adapter = Adapter::new(storage, test_config())
            .register(users().table("people"))
            .unwrap();

        let collection = adapter.collection("users").await.unwrap();
        assert_eq!(collection.table_name(), "people");
    }

    #[tokio::test]
    async fn test_first_and_last_unsupported() {
        let (storage, adapter) = setup(InMemoryStorage::new()).await;

        assert_eq!(
            adapter.first::<Record>("users").await,
            Err(StoreError::Unsupported { operation: "first" })
        );
        assert_eq!(
            adapter.last::<Record>("users").await,
            Err(StoreError::Unsupported { operation: "last" })
        );
        assert_eq!(storage.calls("scan").await, 0);
    }

    #[tokio::test]
    async fn test_clear_deletes_every_item() {
        let (storage, adapter) = setup(InMemoryStorage::new()).await;
        for name in ["Ada", "Grace", "Edsger", "Barbara", "Alan"] {
            adapter.create("users", &mut user(name)).await.unwrap();
        }

        let deleted = adapter.clear("users").await.unwrap();

        assert_eq!(deleted, 5);
        assert_eq!(storage.item_count("test_users").await, 0);
        assert_eq!(adapter.clear("users").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_through_adapter() {
        let (_storage, adapter) = setup(InMemoryStorage::new()).await;
        let mut ada = user("Ada");
        let id = adapter.create("users", &mut ada).await.unwrap();

        let response = adapter
            .query("users")
            .await
            .unwrap()
            .key_eq("id", id)
            .execute()
            .await
            .unwrap();

        assert_eq!(response.entities, vec![ada]);
    }
}
