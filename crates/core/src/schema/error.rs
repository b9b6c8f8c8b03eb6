use thiserror::Error;

/// Errors about the shape of collections, tables and indexes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Index '{index}' not found on table '{table}'")]
    IndexNotFound { table: String, index: String },
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
    #[error("Invalid collection definition: {0}")]
    InvalidDefinition(String),
}
