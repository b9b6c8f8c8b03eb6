//! Traits connecting application types to collection records.

use dynorm_core::value::{Record, Value};
use dynorm_core::Result;

/// An application object that can be persisted into a collection.
pub trait Entity {
    /// Names of the attributes to persist.
    fn attribute_names(&self) -> Vec<String>;

    /// Current value of an attribute; `Value::Null` when absent.
    fn attribute(&self, name: &str) -> Value;

    /// Stores the identity assigned on create.
    fn set_identity(&mut self, name: &str, value: Value);

    /// Snapshot of every persisted attribute.
    fn to_record(&self) -> Record {
        self.attribute_names()
            .into_iter()
            .map(|name| {
                let value = self.attribute(&name);
                (name, value)
            })
            .collect()
    }
}

/// An application object that can be built from a loaded record.
pub trait FromRecord: Sized {
    fn from_record(record: Record) -> Result<Self>;
}

impl Entity for Record {
    fn attribute_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn attribute(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }

    fn set_identity(&mut self, name: &str, value: Value) {
        self.insert(name.to_string(), value);
    }

    fn to_record(&self) -> Record {
        self.clone()
    }
}

impl FromRecord for Record {
    fn from_record(record: Record) -> Result<Self> {
        Ok(record)
    }
}
