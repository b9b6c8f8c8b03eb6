use std::sync::Arc;

use dynorm_core::key::KeyInput;
use dynorm_core::value::Value;
use dynorm_core::Result;

use crate::collection::Collection;
use crate::entity::{Entity, FromRecord};

/// Single-item commands against one collection.
#[derive(Debug, Clone)]
pub struct Commands {
    collection: Arc<Collection>,
}

impl Commands {
    pub fn new(collection: Arc<Collection>) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Persists a new entity and hands the assigned identity back to it.
    pub async fn create_one<E: Entity + ?Sized>(&self, entity: &mut E) -> Result<Value> {
        let mut record = entity.to_record();
        let identity = self.collection.create(&mut record).await?;
        entity.set_identity(self.collection.identity(), identity.clone());
        Ok(identity)
    }

    pub async fn update_one<E: Entity + ?Sized>(&self, entity: &E) -> Result<()> {
        self.collection.update(&entity.to_record()).await
    }

    pub async fn delete_one<E: Entity + ?Sized>(&self, entity: &E) -> Result<()> {
        self.collection.delete(&entity.to_record()).await
    }

    /// Loads one entity by key; `None` when it does not exist or the key is invalid.
    pub async fn get_one<T: FromRecord>(&self, key: impl Into<KeyInput>) -> Result<Option<T>> {
        self.collection
            .get(key)
            .await?
            .map(T::from_record)
            .transpose()
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use dynorm_core::key::ValidationError;
    use dynorm_core::value::Record;
    use dynorm_core::StoreError;

    use super::*;
    use crate::facade::fixtures::{message, messages};

    #[tokio::test]
    async fn test_create_then_get_one() {
        let (_storage, collection) = messages().await;
        let commands = Commands::new(collection);

        let mut record = message("t1", 1, "ada");
        let identity = commands.create_one(&mut record).await.unwrap();
        assert_eq!(identity, Value::from("t1"));

        let loaded: Option<Record> = commands
            .get_one(vec![Value::from("t1"), Value::Int(1)])
            .await
            .unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn test_update_one_removes_null_attributes() {
        let (_storage, collection) = messages().await;
        let commands = Commands::new(collection);

        let mut record = message("t1", 1, "ada");
        record.insert("pinned".to_string(), Value::Bool(true));
        commands.create_one(&mut record).await.unwrap();

        record.insert("pinned".to_string(), Value::Null);
        record.insert("body".to_string(), Value::from("edited"));
        commands.update_one(&record).await.unwrap();

        let loaded: Record = commands
            .get_one(vec![Value::from("t1"), Value::Int(1)])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.get("body"), Some(&Value::from("edited")));
        assert!(!loaded.contains_key("pinned"));
    }

    #[tokio::test]
    async fn test_delete_one() {
        let (storage, collection) = messages().await;
        let commands = Commands::new(collection);

        let mut record = message("t1", 1, "ada");
        commands.create_one(&mut record).await.unwrap();
        commands.delete_one(&record).await.unwrap();

        assert_eq!(storage.item_count("messages").await, 0);
    }

    #[tokio::test]
    async fn test_update_one_without_sort_key_fails() {
        let (storage, collection) = messages().await;
        let commands = Commands::new(collection);

        let mut record = message("t1", 1, "ada");
        record.remove("seq");
        let result = commands.update_one(&record).await;

        assert_eq!(
            result,
            Err(StoreError::Validation(ValidationError::MissingKeyAttribute {
                attribute: "seq".to_string()
            }))
        );
        assert_eq!(storage.calls("update_item").await, 0);
    }
}
