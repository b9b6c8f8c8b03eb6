//! Record and key serialization.
//!
//! Pure functions between application [`Record`]s and storage [`Item`]s. Every value goes
//! through the collection's [`CoercerRegistry`] first and is then marshaled into a typed
//! storage attribute (and the reverse on the way back).

use dynorm_core::coercion::{CoercerRegistry, CoercionError};
use dynorm_core::key::ValidationError;
use dynorm_core::schema::KeySchema;
use dynorm_core::storage::AttributeUpdate;
use dynorm_core::value::{
    from_attribute_value, to_attribute_value, AttributeValue, Item, Record, Value,
};
use dynorm_core::{Result, StoreError};

/// Coerces and marshals one attribute value.
pub fn serialize_value(
    registry: &CoercerRegistry,
    attribute: &str,
    value: &Value,
) -> std::result::Result<AttributeValue, CoercionError> {
    let dumped = registry.dump(attribute, value)?;
    to_attribute_value(attribute, &dumped)
}

/// Serializes a whole record for a put. Attributes that dump to `Null` are left out.
pub fn serialize_item(
    registry: &CoercerRegistry,
    record: &Record,
) -> std::result::Result<Item, CoercionError> {
    let mut item = Item::with_capacity(record.len());
    for (name, value) in record {
        let dumped = registry.dump(name, value)?;
        if dumped.is_null() {
            continue;
        }
        item.insert(name.clone(), to_attribute_value(name, &dumped)?);
    }
    Ok(item)
}

/// Serializes positional key values, walking the key schema in order.
pub fn serialize_key_values(
    registry: &CoercerRegistry,
    schema: &KeySchema,
    values: &[Value],
) -> Result<Item> {
    if values.len() != schema.arity() {
        return Err(ValidationError::KeyArity {
            expected: schema.arity(),
            actual: values.len(),
        }
        .into());
    }

    schema
        .attribute_names()
        .zip(values)
        .map(|(name, value)| {
            Ok::<_, StoreError>((name.to_string(), serialize_value(registry, name, value)?))
        })
        .collect()
}

/// Serializes the key attributes of a record.
///
/// Fails with `MissingKeyAttribute` when a key attribute is absent or `Null`.
pub fn serialize_key(
    registry: &CoercerRegistry,
    schema: &KeySchema,
    record: &Record,
) -> Result<Item> {
    let values = schema
        .attribute_names()
        .map(|name| match record.get(name) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(ValidationError::MissingKeyAttribute {
                attribute: name.to_string(),
            }),
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    serialize_key_values(registry, schema, &values)
}

/// Builds per-attribute update directives for every non-key attribute.
///
/// `Null` becomes a delete directive; anything else is written.
pub fn serialize_attributes(
    registry: &CoercerRegistry,
    schema: &KeySchema,
    record: &Record,
) -> std::result::Result<Vec<(String, AttributeUpdate)>, CoercionError> {
    record
        .iter()
        .filter(|(name, _)| !schema.contains(name))
        .map(|(name, value)| {
            let dumped = registry.dump(name, value)?;
            let update = if dumped.is_null() {
                AttributeUpdate::Delete
            } else {
                AttributeUpdate::Put(to_attribute_value(name, &dumped)?)
            };
            Ok::<_, CoercionError>((name.clone(), update))
        })
        .collect()
}

/// Loads every attribute of a stored item.
pub fn deserialize_item(
    registry: &CoercerRegistry,
    item: &Item,
) -> std::result::Result<Record, CoercionError> {
    item.iter()
        .map(|(name, stored)| {
            let raw = from_attribute_value(stored)?;
            Ok::<_, CoercionError>((name.clone(), registry.load(name, &raw)?))
        })
        .collect()
}

/// Recovers positional application key values from a stored key.
pub fn key_values_from_item(
    registry: &CoercerRegistry,
    schema: &KeySchema,
    item: &Item,
) -> Result<Vec<Value>> {
    schema
        .attribute_names()
        .map(|name| {
            let stored = item
                .get(name)
                .ok_or_else(|| ValidationError::MissingKeyAttribute {
                    attribute: name.to_string(),
                })?;
            let raw = from_attribute_value(stored)?;
            Ok::<_, StoreError>(registry.load(name, &raw)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::{TimeZone, Utc};
    use dynorm_core::coercion::Coercion;

    use super::*;

    fn registry() -> CoercerRegistry {
        CoercerRegistry::new([
            ("thread_id", Coercion::String),
            ("sent_at", Coercion::Timestamp),
            ("body", Coercion::String),
            ("read", Coercion::Boolean),
            ("attachment", Coercion::BinaryStream),
            ("tags", Coercion::Raw),
        ])
        .unwrap()
    }

    fn schema() -> KeySchema {
        KeySchema::composite("thread_id", "sent_at")
    }

    fn message() -> Record {
        Record::from([
            ("thread_id".to_string(), Value::from("t-1")),
            (
                "sent_at".to_string(),
                Value::Timestamp(Utc.timestamp_opt(1_718_000_000, 250_000_000).unwrap()),
            ),
            ("body".to_string(), Value::from("hello")),
            ("read".to_string(), Value::Bool(true)),
            (
                "attachment".to_string(),
                Value::Stream(Cursor::new(vec![0xde, 0xad])),
            ),
            (
                "tags".to_string(),
                Value::List(vec![Value::from("inbox"), Value::Int(2)]),
            ),
        ])
    }

    #[test]
    fn test_record_round_trip() {
        let registry = registry();
        let record = message();

        let item = serialize_item(&registry, &record).unwrap();
        assert_eq!(item["read"], AttributeValue::N("1".to_string()));
        assert_eq!(item["attachment"], AttributeValue::B(vec![0xde, 0xad]));

        assert_eq!(deserialize_item(&registry, &item).unwrap(), record);
    }

    #[test]
    fn test_serialize_item_drops_nulls() {
        let mut record = message();
        record.insert("body".to_string(), Value::Null);

        let item = serialize_item(&registry(), &record).unwrap();

        assert!(!item.contains_key("body"));
        assert_eq!(item.len(), 5);
    }

    #[test]
    fn test_serialize_item_rejects_unknown_attributes() {
        let mut record = message();
        record.insert("nickname".to_string(), Value::from("x"));

        assert_eq!(
            serialize_item(&registry(), &record),
            Err(CoercionError::UnknownAttribute {
                attribute: "nickname".to_string()
            })
        );
    }

    #[test]
    fn test_serialize_key_emits_only_key_attributes() {
        let key = serialize_key(&registry(), &schema(), &message()).unwrap();

        assert_eq!(key.len(), 2);
        assert_eq!(key["thread_id"], AttributeValue::S("t-1".to_string()));
        assert_eq!(key["sent_at"], AttributeValue::N("1718000000.25".to_string()));
    }

    #[test]
    fn test_serialize_key_requires_every_key_attribute() {
        let mut record = message();
        record.insert("sent_at".to_string(), Value::Null);

        assert_eq!(
            serialize_key(&registry(), &schema(), &record),
            Err(StoreError::Validation(ValidationError::MissingKeyAttribute {
                attribute: "sent_at".to_string()
            }))
        );
    }

    #[test]
    fn test_serialize_key_values_checks_arity() {
        let result = serialize_key_values(&registry(), &schema(), &[Value::from("t-1")]);
        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::KeyArity {
                expected: 2,
                actual: 1
            }))
        ));
    }

    #[test]
    fn test_update_null_becomes_delete() {
        let mut record = message();
        record.insert("body".to_string(), Value::Null);

        let updates = serialize_attributes(&registry(), &schema(), &record).unwrap();

        let names: Vec<&str> = updates.iter().map(|(name, _)| name.as_str()).collect();
        assert!(!names.contains(&"thread_id"));
        assert!(!names.contains(&"sent_at"));
        assert!(updates.contains(&("body".to_string(), AttributeUpdate::Delete)));
        assert!(updates.contains(&(
            "read".to_string(),
            AttributeUpdate::Put(AttributeValue::N("1".to_string()))
        )));
    }

    #[test]
    fn test_key_values_from_item_loads_in_schema_order() {
        let registry = registry();
        let record = message();
        let key = serialize_key(&registry, &schema(), &record).unwrap();

        let values = key_values_from_item(&registry, &schema(), &key).unwrap();

        assert_eq!(values, vec![record["thread_id"].clone(), record["sent_at"].clone()]);
    }
}
