use thiserror::Error;

/// Errors raised while converting attribute values between application and storage form.
///
/// These point at a mapping-definition bug, never at a transient fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("No coercion registered for attribute '{attribute}'")]
    UnknownAttribute { attribute: String },
    #[error("Attribute '{attribute}' expects {expected}, found {found}")]
    InvalidValue {
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Attribute '{attribute}' holds a {found} value that cannot be stored")]
    NotStorable {
        attribute: String,
        found: &'static str,
    },
    #[error("Invalid stored number: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_attribute_display() {
        let error = CoercionError::UnknownAttribute {
            attribute: "nickname".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No coercion registered for attribute 'nickname'"
        );
    }

    #[test]
    fn test_invalid_value_display() {
        let error = CoercionError::InvalidValue {
            attribute: "active".to_string(),
            expected: "bool",
            found: "string",
        };
        assert_eq!(
            error.to_string(),
            "Attribute 'active' expects bool, found string"
        );
    }
}
