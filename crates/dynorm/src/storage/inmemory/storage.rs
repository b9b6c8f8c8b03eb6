//! In-memory storage service.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use dynorm_core::schema::{resolve_key_schema, KeySchema, TableDescription};
use dynorm_core::storage::{
    AttributeUpdate, BatchGetOutput, Condition, ConsumedCapacity, PageOutput, QueryOptions,
    ScanOptions, StorageClient, StorageError,
};
use dynorm_core::value::{AttributeValue, Item};

use super::eval::{compare_keys, matches_all, matches_sort};

/// Most keys a single batch read accepts.
const MAX_BATCH_KEYS: usize = 100;

#[derive(Debug)]
struct Table {
    description: TableDescription,
    items: Vec<Item>,
}

impl Table {
    fn key_schema(&self, index: Option<&str>) -> Result<KeySchema, StorageError> {
        resolve_key_schema(&self.description, index)
            .map_err(|e| StorageError::Request(e.to_string()))
    }

    fn table_key_names(&self) -> Vec<String> {
        names(&self.description.key_schema)
    }

    /// Checks that `key` holds exactly the table key attributes.
    fn validate_key(&self, key: &Item) -> Result<(), StorageError> {
        let schema = &self.description.key_schema;
        let complete = schema
            .attribute_names()
            .all(|name| key.get(name).is_some_and(is_key_type));
        if !complete || key.len() != schema.arity() {
            return Err(StorageError::Request(
                "The provided key element does not match the schema".to_string(),
            ));
        }
        Ok(())
    }

    fn position(&self, key: &Item) -> Option<usize> {
        let names = self.table_key_names();
        let wanted = tuple(key, &names);
        self.items
            .iter()
            .position(|item| compare_keys(&tuple(item, &names), &wanted) == Ordering::Equal)
    }
}

/// In-memory storage service for tests and local development.
///
/// Tables are seeded with [`InMemoryStorage::create_table`]. Reads follow the service's
/// paging rules: items come back in key order, `limit` bounds the items evaluated before
/// filters apply, and a continuation key is returned while more items remain.
///
/// Call counters, one-shot fault injection, artificial latency and a per-call batch cap
/// make the storage usable as a test double.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
    faults: Arc<Mutex<HashMap<&'static str, StorageError>>>,
    batch_limit: Option<usize>,
    latency: Option<Duration>,
}

impl InMemoryStorage {
    /// Creates an empty storage with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves at most `limit` keys per batch read; the rest come back unprocessed.
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Creates (or replaces) an empty table.
    pub async fn create_table(&self, description: TableDescription) {
        let mut tables = self.tables.write().await;
        tables.insert(
            description.table_name.clone(),
            Table {
                description,
                items: Vec::new(),
            },
        );
    }

    /// Makes the next call to `operation` fail with `error`.
    pub async fn fail_next(&self, operation: &'static str, error: StorageError) {
        self.faults.lock().await.insert(operation, error);
    }

    /// Number of calls made to `operation` (e.g. `"get_item"`).
    pub async fn calls(&self, operation: &str) -> usize {
        self.calls.lock().await.get(operation).copied().unwrap_or(0)
    }

    /// Number of items stored in `table`.
    pub async fn item_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, |t| t.items.len())
    }

    async fn enter(&self, operation: &'static str) -> Result<(), StorageError> {
        *self.calls.lock().await.entry(operation).or_default() += 1;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = self.faults.lock().await.remove(operation) {
            return Err(error);
        }
        Ok(())
    }
}

fn table_not_found(table: &str) -> StorageError {
    StorageError::TableNotFound(table.to_string())
}

fn is_key_type(value: &AttributeValue) -> bool {
    matches!(
        value,
        AttributeValue::S(_) | AttributeValue::N(_) | AttributeValue::B(_)
    )
}

fn names(schema: &KeySchema) -> Vec<String> {
    schema.attribute_names().map(str::to_string).collect()
}

fn tuple<'a>(item: &'a Item, names: &[String]) -> Vec<Option<&'a AttributeValue>> {
    names.iter().map(|name| item.get(name)).collect()
}

/// Projects `item` onto the named attributes that it has.
fn pick(item: &Item, names: &[String]) -> Item {
    names
        .iter()
        .filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
        .collect()
}

fn segment_of(value: Option<&AttributeValue>, total: u32) -> u32 {
    let mut hasher = DefaultHasher::new();
    match value {
        Some(AttributeValue::S(s)) | Some(AttributeValue::N(s)) => s.hash(&mut hasher),
        Some(AttributeValue::B(b)) => b.hash(&mut hasher),
        _ => {}
    }
    (hasher.finish() % u64::from(total)) as u32
}

fn capacity(table: &str, items: usize) -> Vec<ConsumedCapacity> {
    vec![ConsumedCapacity {
        table_name: Some(table.to_string()),
        capacity_units: Some(items.max(1) as f64 * 0.5),
    }]
}

/// Everything needed to cut one page out of a candidate set.
struct PageRequest<'a> {
    /// Attributes the candidates are ordered by.
    order: Vec<String>,
    /// Attributes that make up a continuation key.
    continuation: Vec<String>,
    forward: bool,
    exclusive_start_key: Option<&'a Item>,
    limit: Option<u32>,
    filters: &'a [Condition<AttributeValue>],
    projection: &'a [String],
}

fn read_page(
    table: &str,
    mut candidates: Vec<&Item>,
    request: PageRequest<'_>,
) -> Result<PageOutput, StorageError> {
    if request.limit == Some(0) {
        return Err(StorageError::Request(
            "Limit must be greater than or equal to 1".to_string(),
        ));
    }

    candidates.sort_by(|a, b| compare_keys(&tuple(a, &request.order), &tuple(b, &request.order)));
    if !request.forward {
        candidates.reverse();
    }

    if let Some(start) = request.exclusive_start_key {
        let start = tuple(start, &request.order);
        let after = if request.forward {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        candidates.retain(|item| compare_keys(&tuple(item, &request.order), &start) == after);
    }

    let evaluated = request
        .limit
        .map_or(candidates.len(), |limit| candidates.len().min(limit as usize));
    let last_evaluated_key = if evaluated < candidates.len() {
        candidates
            .get(evaluated.saturating_sub(1))
            .map(|item| pick(item, &request.continuation))
    } else {
        None
    };

    let items: Vec<Item> = candidates
        .into_iter()
        .take(evaluated)
        .filter(|item| matches_all(item, request.filters))
        .map(|item| {
            if request.projection.is_empty() {
                item.clone()
            } else {
                pick(item, request.projection)
            }
        })
        .collect();

    Ok(PageOutput {
        count: items.len(),
        consumed_capacity: capacity(table, evaluated),
        items,
        last_evaluated_key,
    })
}

#[async_trait]
impl StorageClient for InMemoryStorage {
    async fn put_item(&self, table: &str, item: Item) -> Result<(), StorageError> {
        self.enter("put_item").await?;
        let mut tables = self.tables.write().await;
        let stored = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;

        let key = pick(&item, &stored.table_key_names());
        stored.validate_key(&key)?;

        match stored.position(&key) {
            Some(position) => stored.items[position] = item,
            None => stored.items.push(item),
        }
        Ok(())
    }

    async fn update_item(
        &self,
        table: &str,
        key: Item,
        updates: Vec<(String, AttributeUpdate)>,
    ) -> Result<(), StorageError> {
        self.enter("update_item").await?;
        let mut tables = self.tables.write().await;
        let stored = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        stored.validate_key(&key)?;

        if let Some((name, _)) = updates
            .iter()
            .find(|(name, _)| stored.description.key_schema.contains(name))
        {
            return Err(StorageError::Request(format!(
                "Cannot update attribute {name}. This attribute is part of the key"
            )));
        }

        let position = match stored.position(&key) {
            Some(position) => position,
            None => {
                stored.items.push(key);
                stored.items.len() - 1
            }
        };
        let item = &mut stored.items[position];
        for (name, update) in updates {
            match update {
                AttributeUpdate::Put(value) => {
                    item.insert(name, value);
                }
                AttributeUpdate::Delete => {
                    item.remove(&name);
                }
            }
        }
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: Item) -> Result<(), StorageError> {
        self.enter("delete_item").await?;
        let mut tables = self.tables.write().await;
        let stored = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        stored.validate_key(&key)?;

        if let Some(position) = stored.position(&key) {
            stored.items.remove(position);
        }
        Ok(())
    }

    async fn get_item(
        &self,
        table: &str,
        key: Item,
        _consistent_read: bool,
    ) -> Result<Option<Item>, StorageError> {
        self.enter("get_item").await?;
        let tables = self.tables.read().await;
        let stored = tables.get(table).ok_or_else(|| table_not_found(table))?;
        stored.validate_key(&key)?;

        Ok(stored.position(&key).map(|p| stored.items[p].clone()))
    }

    async fn batch_get_item(
        &self,
        table: &str,
        keys: Vec<Item>,
        _consistent_read: bool,
    ) -> Result<BatchGetOutput, StorageError> {
        self.enter("batch_get_item").await?;
        if keys.is_empty() || keys.len() > MAX_BATCH_KEYS {
            return Err(StorageError::Request(format!(
                "Batch reads take between 1 and {MAX_BATCH_KEYS} keys, got {}",
                keys.len()
            )));
        }

        let tables = self.tables.read().await;
        let stored = tables.get(table).ok_or_else(|| table_not_found(table))?;
        for key in &keys {
            stored.validate_key(key)?;
        }

        let served = self.batch_limit.map_or(keys.len(), |limit| keys.len().min(limit));
        let mut keys = keys;
        let unprocessed_keys = keys.split_off(served);
        let items: Vec<Item> = keys
            .iter()
            .filter_map(|key| stored.position(key).map(|p| stored.items[p].clone()))
            .collect();

        Ok(BatchGetOutput {
            consumed_capacity: capacity(table, served),
            items,
            unprocessed_keys,
        })
    }

    async fn query(&self, table: &str, options: QueryOptions) -> Result<PageOutput, StorageError> {
        self.enter("query").await?;
        let tables = self.tables.read().await;
        let stored = tables.get(table).ok_or_else(|| table_not_found(table))?;
        let schema = stored.key_schema(options.index_name.as_deref())?;

        let (partition_name, partition_value) = &options.key_condition.partition;
        if schema.partition_key() != Some(partition_name.as_str()) {
            return Err(StorageError::Request(format!(
                "Query key condition not supported: {partition_name} is not the partition key"
            )));
        }
        if let Some((sort_name, _)) = &options.key_condition.sort {
            if schema.sort_key() != Some(sort_name.as_str()) {
                return Err(StorageError::Request(format!(
                    "Query key condition not supported: {sort_name} is not the sort key"
                )));
            }
        }

        let candidates: Vec<&Item> = stored
            .items
            .iter()
            .filter(|item| schema.attribute_names().all(|name| item.contains_key(name)))
            .filter(|item| {
                item.get(partition_name)
                    .is_some_and(|v| compare_keys(&[Some(v)], &[Some(partition_value)]).is_eq())
            })
            .filter(|item| match &options.key_condition.sort {
                Some((name, condition)) => matches_sort(item.get(name), condition),
                None => true,
            })
            .collect();

        let table_keys = stored.table_key_names();
        let mut order: Vec<String> = schema.sort_key().map(str::to_string).into_iter().collect();
        order.extend(table_keys.iter().cloned());
        let mut continuation = names(&schema);
        continuation.extend(table_keys.into_iter().filter(|n| !schema.contains(n)));

        read_page(
            table,
            candidates,
            PageRequest {
                order,
                continuation,
                forward: options.scan_index_forward,
                exclusive_start_key: options.exclusive_start_key.as_ref(),
                limit: options.limit,
                filters: &options.filters,
                projection: &options.projection,
            },
        )
    }

    async fn scan(&self, table: &str, options: ScanOptions) -> Result<PageOutput, StorageError> {
        self.enter("scan").await?;
        let tables = self.tables.read().await;
        let stored = tables.get(table).ok_or_else(|| table_not_found(table))?;
        let schema = stored.key_schema(options.index_name.as_deref())?;

        if let Some((segment, total)) = options.segment {
            if total == 0 || segment >= total {
                return Err(StorageError::Request(format!(
                    "Invalid scan segment {segment} of {total}"
                )));
            }
        }

        let partition = schema.partition_key().map(str::to_string);
        let candidates: Vec<&Item> = stored
            .items
            .iter()
            .filter(|item| schema.attribute_names().all(|name| item.contains_key(name)))
            .filter(|item| match (options.segment, &partition) {
                (Some((segment, total)), Some(partition)) => {
                    segment_of(item.get(partition), total) == segment
                }
                _ => true,
            })
            .collect();

        let table_keys = stored.table_key_names();
        let mut order = names(&schema);
        order.extend(table_keys.into_iter().filter(|n| !schema.contains(n)));

        read_page(
            table,
            candidates,
            PageRequest {
                continuation: order.clone(),
                order,
                forward: true,
                exclusive_start_key: options.exclusive_start_key.as_ref(),
                limit: options.limit,
                filters: &options.filters,
                projection: &options.projection,
            },
        )
    }

    async fn describe_table(&self, table: &str) -> Result<TableDescription, StorageError> {
        self.enter("describe_table").await?;
        let tables = self.tables.read().await;
        tables
            .get(table)
            .map(|t| t.description.clone())
            .ok_or_else(|| table_not_found(table))
    }
}

#[cfg(test)]
mod tests {
    use dynorm_core::storage::{Comparison, KeyCondition, SortCondition};

    use super::*;

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    fn n(value: i64) -> AttributeValue {
        AttributeValue::N(value.to_string())
    }

    fn event(calendar: &str, at: i64, kind: &str) -> Item {
        Item::from([
            ("calendar_id".to_string(), s(calendar)),
            ("starts_at".to_string(), n(at)),
            ("kind".to_string(), s(kind)),
        ])
    }

    fn key(calendar: &str, at: i64) -> Item {
        Item::from([
            ("calendar_id".to_string(), s(calendar)),
            ("starts_at".to_string(), n(at)),
        ])
    }

    async fn storage() -> InMemoryStorage {
        let storage = InMemoryStorage::new();
        storage
            .create_table(
                TableDescription::new("events", KeySchema::composite("calendar_id", "starts_at"))
                    .with_global_index("by_kind", KeySchema::composite("kind", "starts_at")),
            )
            .await;
        for (calendar, at, kind) in [
            ("c1", 30, "meeting"),
            ("c1", 10, "task"),
            ("c1", 20, "meeting"),
            ("c2", 15, "meeting"),
            ("c1", 40, "reminder"),
        ] {
            storage.put_item("events", event(calendar, at, kind)).await.unwrap();
        }
        storage
    }

    fn partition(calendar: &str) -> QueryOptions {
        QueryOptions::new(KeyCondition {
            partition: ("calendar_id".to_string(), s(calendar)),
            sort: None,
        })
    }

    fn starts(page: &PageOutput) -> Vec<&AttributeValue> {
        page.items.iter().map(|item| &item["starts_at"]).collect()
    }

    #[tokio::test]
    async fn test_put_replaces_item_with_same_key() {
        let storage = storage().await;

        storage.put_item("events", event("c1", 10, "holiday")).await.unwrap();

        let item = storage.get_item("events", key("c1", 10), false).await.unwrap();
        assert_eq!(item.unwrap()["kind"], s("holiday"));
        assert_eq!(storage.item_count("events").await, 5);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let storage = InMemoryStorage::new();
        assert_eq!(
            storage.get_item("nope", key("c1", 10), false).await,
            Err(StorageError::TableNotFound("nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_key_must_match_schema() {
        let storage = storage().await;
        let mut partial = key("c1", 10);
        partial.remove("starts_at");

        assert!(matches!(
            storage.get_item("events", partial, false).await,
            Err(StorageError::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_query_orders_by_sort_key() {
        let storage = storage().await;

        let page = storage.query("events", partition("c1")).await.unwrap();

        assert_eq!(starts(&page), vec![&n(10), &n(20), &n(30), &n(40)]);
        assert_eq!(page.count, 4);
        assert_eq!(page.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_query_descending_with_sort_condition() {
        let storage = storage().await;
        let mut options = partition("c1");
        options.key_condition.sort = Some(("starts_at".to_string(), SortCondition::Le(n(30))));
        options.scan_index_forward = false;

        let page = storage.query("events", options).await.unwrap();

        assert_eq!(starts(&page), vec![&n(30), &n(20), &n(10)]);
    }

    #[tokio::test]
    async fn test_query_pagination() {
        let storage = storage().await;
        let mut options = partition("c1");
        options.limit = Some(3);

        let first = storage.query("events", options.clone()).await.unwrap();
        assert_eq!(starts(&first), vec![&n(10), &n(20), &n(30)]);
        assert_eq!(first.last_evaluated_key, Some(key("c1", 30)));

        options.exclusive_start_key = first.last_evaluated_key;
        let second = storage.query("events", options).await.unwrap();
        assert_eq!(starts(&second), vec![&n(40)]);
        assert_eq!(second.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_limit_applies_before_filters() {
        let storage = storage().await;
        let mut options = partition("c1");
        options.limit = Some(2);
        options.filters = vec![Condition {
            attribute: "kind".to_string(),
            comparison: Comparison::Eq(s("meeting")),
        }];

        let page = storage.query("events", options).await.unwrap();

        assert_eq!(page.count, 1);
        assert!(page.last_evaluated_key.is_some());
    }

    #[tokio::test]
    async fn test_query_index() {
        let storage = storage().await;
        let mut options = QueryOptions::new(KeyCondition {
            partition: ("kind".to_string(), s("meeting")),
            sort: None,
        });
        options.index_name = Some("by_kind".to_string());
        options.projection = vec!["calendar_id".to_string()];

        let page = storage.query("events", options).await.unwrap();

        let calendars: Vec<&AttributeValue> =
            page.items.iter().map(|item| &item["calendar_id"]).collect();
        assert_eq!(calendars, vec![&s("c2"), &s("c1"), &s("c1")]);
        assert!(page.items.iter().all(|item| item.len() == 1));
    }

    #[tokio::test]
    async fn test_query_rejects_non_key_partition() {
        let storage = storage().await;
        let options = QueryOptions::new(KeyCondition {
            partition: ("kind".to_string(), s("meeting")),
            sort: None,
        });

        assert!(matches!(
            storage.query("events", options).await,
            Err(StorageError::Request(_))
        ));
    }

    #[tokio::test]
    async fn test_scan_continues_past_deleted_items() {
        let storage = storage().await;
        let first = storage
            .scan(
                "events",
                ScanOptions {
                    limit: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let continuation = first.last_evaluated_key.clone().unwrap();

        for item in &first.items {
            storage
                .delete_item(
                    "events",
                    pick(item, &["calendar_id".to_string(), "starts_at".to_string()]),
                )
                .await
                .unwrap();
        }
        let rest = storage
            .scan(
                "events",
                ScanOptions {
                    exclusive_start_key: Some(continuation),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(rest.count, 3);
        assert_eq!(storage.item_count("events").await, 3);
    }

    #[tokio::test]
    async fn test_scan_segments_partition_the_table() {
        let storage = storage().await;
        let mut total = 0;
        for segment in 0..3 {
            let page = storage
                .scan(
                    "events",
                    ScanOptions {
                        segment: Some((segment, 3)),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            total += page.count;
        }
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_update_upserts_and_removes() {
        let storage = storage().await;

        storage
            .update_item(
                "events",
                key("c3", 5),
                vec![("kind".to_string(), AttributeUpdate::Put(s("task")))],
            )
            .await
            .unwrap();
        storage
            .update_item(
                "events",
                key("c1", 10),
                vec![("kind".to_string(), AttributeUpdate::Delete)],
            )
            .await
            .unwrap();

        let created = storage.get_item("events", key("c3", 5), false).await.unwrap();
        let trimmed = storage.get_item("events", key("c1", 10), false).await.unwrap();
        assert_eq!(created, Some(event("c3", 5, "task")));
        assert_eq!(trimmed, Some(key("c1", 10)));
    }

    #[tokio::test]
    async fn test_update_rejects_key_attributes() {
        let storage = storage().await;
        let result = storage
            .update_item(
                "events",
                key("c1", 10),
                vec![("starts_at".to_string(), AttributeUpdate::Put(n(11)))],
            )
            .await;
        assert!(matches!(result, Err(StorageError::Request(_))));
    }

    #[tokio::test]
    async fn test_batch_limit_leaves_unprocessed_keys() {
        let storage = storage().await.with_batch_limit(2);

        let output = storage
            .batch_get_item(
                "events",
                vec![key("c1", 10), key("c1", 20), key("c9", 1)],
                false,
            )
            .await
            .unwrap();

        assert_eq!(output.items.len(), 2);
        assert_eq!(output.unprocessed_keys, vec![key("c9", 1)]);
    }

    #[tokio::test]
    async fn test_fault_injection_is_one_shot() {
        let storage = storage().await;
        storage
            .fail_next("scan", StorageError::Throttled("slow down".to_string()))
            .await;

        assert!(storage.scan("events", ScanOptions::default()).await.is_err());
        assert!(storage.scan("events", ScanOptions::default()).await.is_ok());
        assert_eq!(storage.calls("scan").await, 2);
    }
}
