//! Key normalization and validation.
//!
//! Keys arrive positionally (values in key-schema order) or by name (a record holding at
//! least the key attributes). Both are normalized to a positional list that matches the
//! schema's arity and contains no empty component.

use crate::schema::KeySchema;
use crate::value::{Record, Value};

use super::ValidationError;

/// A key as supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyInput {
    /// Key components in key-schema order.
    Positional(Vec<Value>),
    /// A record carrying the key attributes by name.
    Named(Record),
}

impl From<Vec<Value>> for KeyInput {
    fn from(values: Vec<Value>) -> Self {
        KeyInput::Positional(values)
    }
}

impl From<Value> for KeyInput {
    fn from(value: Value) -> Self {
        KeyInput::Positional(vec![value])
    }
}

impl From<&str> for KeyInput {
    fn from(value: &str) -> Self {
        KeyInput::Positional(vec![Value::from(value)])
    }
}

impl From<Record> for KeyInput {
    fn from(record: Record) -> Self {
        KeyInput::Named(record)
    }
}

/// Normalizes a key to its positional form, checking arity and emptiness.
pub fn normalize_key(schema: &KeySchema, key: &KeyInput) -> Result<Vec<Value>, ValidationError> {
    let values = match key {
        KeyInput::Positional(values) => {
            if values.len() != schema.arity() {
                return Err(ValidationError::KeyArity {
                    expected: schema.arity(),
                    actual: values.len(),
                });
            }
            values.clone()
        }
        KeyInput::Named(record) => schema
            .attribute_names()
            .map(|name| {
                record
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ValidationError::MissingKeyAttribute {
                        attribute: name.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    for (name, value) in schema.attribute_names().zip(&values) {
        if value.is_empty() {
            return Err(ValidationError::EmptyKeyComponent {
                attribute: name.to_string(),
            });
        }
    }

    Ok(values)
}

/// Removes repeated keys, keeping the first occurrence of each.
///
/// Run it on serialized keys: distinct application values (`Int(1)` and `Float(1.0)`,
/// say) can serialize to the same stored key.
pub fn dedupe_keys<K: PartialEq>(keys: Vec<K>) -> Vec<K> {
    let mut unique: Vec<K> = Vec::with_capacity(keys.len());
    for key in keys {
        if !unique.contains(&key) {
            unique.push(key);
        }
    }
    unique
}
