mod error;
mod resolve;
mod types;

pub use error::SchemaError;
pub use resolve::resolve_key_schema;
pub use types::{IndexDescription, KeyElement, KeyRole, KeySchema, TableDescription};
