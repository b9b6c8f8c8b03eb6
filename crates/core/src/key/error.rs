use thiserror::Error;

/// Malformed input detected locally, before any storage call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Key has {actual} components, schema expects {expected}")]
    KeyArity { expected: usize, actual: usize },
    #[error("Key component '{attribute}' is empty")]
    EmptyKeyComponent { attribute: String },
    #[error("Record is missing key attribute '{attribute}'")]
    MissingKeyAttribute { attribute: String },
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_arity_display() {
        let error = ValidationError::KeyArity {
            expected: 2,
            actual: 1,
        };
        assert_eq!(error.to_string(), "Key has 1 components, schema expects 2");
    }

    #[test]
    fn test_missing_key_attribute_display() {
        let error = ValidationError::MissingKeyAttribute {
            attribute: "id".to_string(),
        };
        assert_eq!(error.to_string(), "Record is missing key attribute 'id'");
    }
}
