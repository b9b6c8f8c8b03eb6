use std::collections::HashMap;

use crate::schema::SchemaError;
use crate::value::Value;

use super::{Codec, CoercionError};

/// Per-collection mapping from attribute name to its dump/load pair.
///
/// Built once from the collection's attribute definitions. Every persisted attribute
/// must have an entry; dumping or loading anything else fails.
#[derive(Debug, Clone, Default)]
pub struct CoercerRegistry {
    codecs: HashMap<String, Codec>,
}

impl CoercerRegistry {
    /// Builds a registry, rejecting empty and duplicate attribute names.
    pub fn new<I, S, C>(attributes: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<Codec>,
    {
        let mut codecs = HashMap::new();
        for (name, codec) in attributes {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(SchemaError::InvalidDefinition(
                    "attribute names must not be empty".to_string(),
                ));
            }
            if codecs.insert(name.clone(), codec.into()).is_some() {
                return Err(SchemaError::InvalidDefinition(format!(
                    "attribute '{name}' is declared twice"
                )));
            }
        }
        Ok(Self { codecs })
    }

    /// Returns true if the attribute has a registered codec.
    pub fn contains(&self, attribute: &str) -> bool {
        self.codecs.contains_key(attribute)
    }

    /// Registered attribute names, in no particular order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }

    /// Converts an application value into its storage-ready form.
    pub fn dump(&self, attribute: &str, value: &Value) -> Result<Value, CoercionError> {
        let codec = self.codec(attribute)?;
        if value.is_null() {
            return Ok(Value::Null);
        }
        codec.dump(attribute, value)
    }

    /// Converts a storage-ready value back into its application form.
    pub fn load(&self, attribute: &str, value: &Value) -> Result<Value, CoercionError> {
        let codec = self.codec(attribute)?;
        if value.is_null() {
            return Ok(Value::Null);
        }
        codec.load(attribute, value)
    }

    fn codec(&self, attribute: &str) -> Result<&Codec, CoercionError> {
        self.codecs
            .get(attribute)
            .ok_or_else(|| CoercionError::UnknownAttribute {
                attribute: attribute.to_string(),
            })
    }
}
