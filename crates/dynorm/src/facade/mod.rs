//! Command/query façade.
//!
//! Thin, typed entry points over a [`Collection`](crate::collection::Collection):
//! [`Commands`] for single-item writes and reads, [`QueryBuilder`] and [`ScanBuilder`]
//! for paginated reads. Condition operands are application values; they are coerced by
//! attribute name when the builder executes.

mod commands;
mod query;
mod scan;

use dynorm_core::response::decode_cursor;
use dynorm_core::storage::Condition;
use dynorm_core::value::{AttributeValue, Item, Value};
use dynorm_core::{Result, StoreError};

use crate::collection::Collection;

pub use commands::Commands;
pub use query::QueryBuilder;
pub use scan::ScanBuilder;

/// Continuation point of a query or scan.
#[derive(Debug, Clone, PartialEq)]
enum StartKey {
    Key(Item),
    Cursor(String),
}

impl StartKey {
    fn into_item(self) -> Result<Item> {
        match self {
            StartKey::Key(item) => Ok(item),
            StartKey::Cursor(cursor) => Ok(decode_cursor(&cursor)?),
        }
    }
}

/// Coerces and marshals the operands of `filters`.
fn coerce_filters(
    collection: &Collection,
    filters: &[Condition<Value>],
) -> Result<Vec<Condition<AttributeValue>>> {
    filters
        .iter()
        .map(|filter| {
            let comparison = filter
                .comparison
                .clone()
                .try_map(|value| collection.serialize_value(&filter.attribute, &value))?;
            Ok::<_, StoreError>(Condition {
                attribute: filter.attribute.clone(),
                comparison,
            })
        })
        .collect()
}

#[cfg(all(test, feature = "inmemory"))]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use dynorm_core::coercion::{CoercerRegistry, Coercion};
    use dynorm_core::schema::{KeySchema, TableDescription};
    use dynorm_core::value::{Record, Value};

    use crate::collection::Collection;
    use crate::storage::inmemory::InMemoryStorage;

    /// A `messages` table keyed by thread and sequence number, with an author index.
    pub async fn messages() -> (Arc<InMemoryStorage>, Arc<Collection>) {
        let storage = Arc::new(InMemoryStorage::new());
        storage
            .create_table(
                TableDescription::new("messages", KeySchema::composite("thread_id", "seq"))
                    .with_global_index("by_author", KeySchema::composite("author", "seq")),
            )
            .await;

        let registry = CoercerRegistry::new([
            ("thread_id", Coercion::String),
            ("seq", Coercion::Integer),
            ("author", Coercion::String),
            ("body", Coercion::String),
            ("pinned", Coercion::Boolean),
        ])
        .unwrap();
        let collection = Collection::new(
            "messages",
            "messages",
            "thread_id",
            registry,
            storage.clone(),
        );

        (storage, Arc::new(collection))
    }

    pub fn message(thread: &str, seq: i64, author: &str) -> Record {
        Record::from([
            ("thread_id".to_string(), Value::from(thread)),
            ("seq".to_string(), Value::Int(seq)),
            ("author".to_string(), Value::from(author)),
            ("body".to_string(), Value::from(format!("message {seq}"))),
        ])
    }

    /// Writes messages 1..=count of `thread`, alternating between two authors.
    pub async fn seed(collection: &Collection, thread: &str, count: i64) {
        for seq in 1..=count {
            let author = if seq % 2 == 0 { "grace" } else { "ada" };
            collection
                .create(&mut message(thread, seq, author))
                .await
                .unwrap();
        }
    }

    pub fn seqs(records: &[Record]) -> Vec<i64> {
        records
            .iter()
            .map(|record| match record.get("seq") {
                Some(Value::Int(seq)) => *seq,
                other => panic!("unexpected seq: {other:?}"),
            })
            .collect()
    }
}
