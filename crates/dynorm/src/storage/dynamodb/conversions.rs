//! Conversions between core storage values and SDK attribute values.
//!
//! Pure functions, testable without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{self as sdk, AttributeValue as SdkValue, KeyType};

use dynorm_core::schema::{IndexDescription, KeyElement, KeyRole, KeySchema, TableDescription};
use dynorm_core::storage::{ConsumedCapacity, StorageError};
use dynorm_core::value::{AttributeValue, Item};

/// Convert a core attribute value to its SDK form.
pub fn to_sdk_value(value: AttributeValue) -> SdkValue {
    match value {
        AttributeValue::S(s) => SdkValue::S(s),
        AttributeValue::N(n) => SdkValue::N(n),
        AttributeValue::B(b) => SdkValue::B(Blob::new(b)),
        AttributeValue::Bool(b) => SdkValue::Bool(b),
        AttributeValue::Null(b) => SdkValue::Null(b),
        AttributeValue::L(items) => SdkValue::L(items.into_iter().map(to_sdk_value).collect()),
        AttributeValue::M(map) => SdkValue::M(to_sdk_item(map)),
        AttributeValue::Ss(items) => SdkValue::Ss(items),
        AttributeValue::Ns(items) => SdkValue::Ns(items),
        AttributeValue::Bs(items) => SdkValue::Bs(items.into_iter().map(Blob::new).collect()),
    }
}

/// Convert an SDK attribute value to its core form.
pub fn from_sdk_value(value: SdkValue) -> Result<AttributeValue, StorageError> {
    Ok(match value {
        SdkValue::S(s) => AttributeValue::S(s),
        SdkValue::N(n) => AttributeValue::N(n),
        SdkValue::B(b) => AttributeValue::B(b.into_inner()),
        SdkValue::Bool(b) => AttributeValue::Bool(b),
        SdkValue::Null(b) => AttributeValue::Null(b),
        SdkValue::L(items) => AttributeValue::L(
            items
                .into_iter()
                .map(from_sdk_value)
                .collect::<Result<_, _>>()?,
        ),
        SdkValue::M(map) => AttributeValue::M(from_sdk_item(map)?),
        SdkValue::Ss(items) => AttributeValue::Ss(items),
        SdkValue::Ns(items) => AttributeValue::Ns(items),
        SdkValue::Bs(items) => {
            AttributeValue::Bs(items.into_iter().map(Blob::into_inner).collect())
        }
        other => {
            return Err(StorageError::Service(format!(
                "Unsupported attribute value: {other:?}"
            )))
        }
    })
}

/// Convert a core item to its SDK form.
pub fn to_sdk_item(item: Item) -> HashMap<String, SdkValue> {
    item.into_iter().map(|(k, v)| (k, to_sdk_value(v))).collect()
}

/// Convert an SDK item to its core form.
pub fn from_sdk_item(item: HashMap<String, SdkValue>) -> Result<Item, StorageError> {
    item.into_iter()
        .map(|(k, v)| Ok::<_, StorageError>((k, from_sdk_value(v)?)))
        .collect()
}

pub fn from_sdk_items(
    items: Option<Vec<HashMap<String, SdkValue>>>,
) -> Result<Vec<Item>, StorageError> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(from_sdk_item)
        .collect()
}

pub fn from_sdk_capacity(capacity: sdk::ConsumedCapacity) -> ConsumedCapacity {
    ConsumedCapacity {
        table_name: capacity.table_name,
        capacity_units: capacity.capacity_units,
    }
}

/// Convert an SDK key schema; elements with unknown key types are skipped.
pub fn from_sdk_key_schema(elements: &[sdk::KeySchemaElement]) -> KeySchema {
    KeySchema::new(elements.iter().filter_map(|element| {
        let role = match element.key_type() {
            KeyType::Hash => KeyRole::Partition,
            KeyType::Range => KeyRole::Sort,
            _ => return None,
        };
        Some(KeyElement {
            attribute_name: element.attribute_name().to_string(),
            role,
        })
    }))
}

/// Convert a DescribeTable response body.
pub fn from_sdk_table(table: &sdk::TableDescription) -> TableDescription {
    let local = table.local_secondary_indexes().iter().map(|index| IndexDescription {
        name: index.index_name().unwrap_or_default().to_string(),
        key_schema: from_sdk_key_schema(index.key_schema()),
    });
    let global = table.global_secondary_indexes().iter().map(|index| IndexDescription {
        name: index.index_name().unwrap_or_default().to_string(),
        key_schema: from_sdk_key_schema(index.key_schema()),
    });

    TableDescription {
        table_name: table.table_name().unwrap_or_default().to_string(),
        key_schema: from_sdk_key_schema(table.key_schema()),
        local_secondary_indexes: local.collect(),
        global_secondary_indexes: global.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_round_trip() {
        let value = AttributeValue::M(HashMap::from([
            ("name".to_string(), AttributeValue::S("Ada".to_string())),
            ("age".to_string(), AttributeValue::N("36".to_string())),
            ("avatar".to_string(), AttributeValue::B(vec![1, 2, 3])),
            (
                "tags".to_string(),
                AttributeValue::L(vec![AttributeValue::Bool(true), AttributeValue::Null(true)]),
            ),
        ]));

        assert_eq!(from_sdk_value(to_sdk_value(value.clone())), Ok(value));
    }

    #[test]
    fn test_key_schema_orders_hash_first() {
        let elements = vec![
            sdk::KeySchemaElement::builder()
                .attribute_name("sent_at")
                .key_type(KeyType::Range)
                .build()
                .unwrap(),
            sdk::KeySchemaElement::builder()
                .attribute_name("thread_id")
                .key_type(KeyType::Hash)
                .build()
                .unwrap(),
        ];

        assert_eq!(
            from_sdk_key_schema(&elements),
            KeySchema::composite("thread_id", "sent_at")
        );
    }

    #[test]
    fn test_table_description_with_indexes() {
        let table = sdk::TableDescription::builder()
            .table_name("messages")
            .key_schema(
                sdk::KeySchemaElement::builder()
                    .attribute_name("id")
                    .key_type(KeyType::Hash)
                    .build()
                    .unwrap(),
            )
            .global_secondary_indexes(
                sdk::GlobalSecondaryIndexDescription::builder()
                    .index_name("by_author")
                    .key_schema(
                        sdk::KeySchemaElement::builder()
                            .attribute_name("author")
                            .key_type(KeyType::Hash)
                            .build()
                            .unwrap(),
                    )
                    .build(),
            )
            .build();

        let description = from_sdk_table(&table);

        assert_eq!(
            description,
            TableDescription::new("messages", KeySchema::partition("id"))
                .with_global_index("by_author", KeySchema::partition("author"))
        );
    }
}
