use dynorm_core::coercion::{CoercerRegistry, Codec};
use dynorm_core::schema::SchemaError;

/// Static description of a collection: its identity attribute and one codec per
/// persisted attribute.
#[derive(Debug, Clone)]
pub struct CollectionDefinition {
    pub name: String,
    pub identity: String,
    /// Explicit table name; otherwise the configured prefix plus `name`.
    pub table_name: Option<String>,
    pub attributes: Vec<(String, Codec)>,
}

impl CollectionDefinition {
    pub fn new(name: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: identity.into(),
            table_name: None,
            attributes: Vec::new(),
        }
    }

    /// Backs the collection with `table_name` instead of the derived name.
    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Registers a persisted attribute.
    pub fn attribute(mut self, name: impl Into<String>, codec: impl Into<Codec>) -> Self {
        self.attributes.push((name.into(), codec.into()));
        self
    }

    /// Builds the coercion registry, checking the definition is usable.
    pub fn registry(&self) -> Result<CoercerRegistry, SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::InvalidDefinition(
                "collection name must not be empty".to_string(),
            ));
        }

        let registry = CoercerRegistry::new(self.attributes.iter().cloned())?;
        if !registry.contains(&self.identity) {
            return Err(SchemaError::InvalidDefinition(format!(
                "identity attribute '{}' of collection '{}' has no coercion",
                self.identity, self.name
            )));
        }
        Ok(registry)
    }
}
