use super::{KeySchema, SchemaError, TableDescription};

/// Picks the key schema for the table (`index = None`) or for a named secondary index.
///
/// Local indexes are searched before global ones.
pub fn resolve_key_schema(
    description: &TableDescription,
    index: Option<&str>,
) -> Result<KeySchema, SchemaError> {
    let Some(name) = index else {
        return Ok(description.key_schema.clone());
    };

    description
        .indexes()
        .find(|i| i.name == name)
        .map(|i| i.key_schema.clone())
        .ok_or_else(|| SchemaError::IndexNotFound {
            table: description.table_name.clone(),
            index: name.to_string(),
        })
}
