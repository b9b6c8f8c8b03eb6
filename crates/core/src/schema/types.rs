use serde::{Deserialize, Serialize};

/// The role an attribute plays within a key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyRole {
    /// Determines data distribution (the service's `HASH` key).
    Partition,
    /// Orders records sharing a partition key (the service's `RANGE` key).
    Sort,
}

/// One attribute of a key schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyElement {
    pub attribute_name: String,
    pub role: KeyRole,
}

/// The ordered key attributes of a table or index.
///
/// The partition key always comes first. Positional keys rely on this order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeySchema {
    elements: Vec<KeyElement>,
}

impl KeySchema {
    /// Builds a key schema, moving the partition key ahead of the sort key.
    pub fn new(elements: impl IntoIterator<Item = KeyElement>) -> Self {
        let mut elements: Vec<KeyElement> = elements.into_iter().collect();
        elements.sort_by_key(|e| e.role);
        Self { elements }
    }

    /// Shorthand for a partition-only schema.
    pub fn partition(name: impl Into<String>) -> Self {
        Self::new([KeyElement {
            attribute_name: name.into(),
            role: KeyRole::Partition,
        }])
    }

    /// Shorthand for a partition + sort schema.
    pub fn composite(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self::new([
            KeyElement {
                attribute_name: partition.into(),
                role: KeyRole::Partition,
            },
            KeyElement {
                attribute_name: sort.into(),
                role: KeyRole::Sort,
            },
        ])
    }

    /// Number of key attributes.
    pub fn arity(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[KeyElement] {
        &self.elements
    }

    /// Key attribute names in schema order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|e| e.attribute_name.as_str())
    }

    /// Returns true if the attribute is part of this key.
    pub fn contains(&self, attribute: &str) -> bool {
        self.elements.iter().any(|e| e.attribute_name == attribute)
    }

    pub fn partition_key(&self) -> Option<&str> {
        self.attribute_with(KeyRole::Partition)
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.attribute_with(KeyRole::Sort)
    }

    fn attribute_with(&self, role: KeyRole) -> Option<&str> {
        self.elements
            .iter()
            .find(|e| e.role == role)
            .map(|e| e.attribute_name.as_str())
    }
}

/// A local or global secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    pub key_schema: KeySchema,
}

/// The schema description of a table as reported by the storage service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub table_name: String,
    pub key_schema: KeySchema,
    pub local_secondary_indexes: Vec<IndexDescription>,
    pub global_secondary_indexes: Vec<IndexDescription>,
}

impl TableDescription {
    /// Describes a table without secondary indexes.
    pub fn new(table_name: impl Into<String>, key_schema: KeySchema) -> Self {
        Self {
            table_name: table_name.into(),
            key_schema,
            local_secondary_indexes: Vec::new(),
            global_secondary_indexes: Vec::new(),
        }
    }

    /// Adds a local secondary index.
    pub fn with_local_index(mut self, name: impl Into<String>, key_schema: KeySchema) -> Self {
        self.local_secondary_indexes.push(IndexDescription {
            name: name.into(),
            key_schema,
        });
        self
    }

    /// Adds a global secondary index.
    pub fn with_global_index(mut self, name: impl Into<String>, key_schema: KeySchema) -> Self {
        self.global_secondary_indexes.push(IndexDescription {
            name: name.into(),
            key_schema,
        });
        self
    }

    /// All secondary indexes, local ones first.
    pub fn indexes(&self) -> impl Iterator<Item = &IndexDescription> {
        self.local_secondary_indexes
            .iter()
            .chain(self.global_secondary_indexes.iter())
    }
}
