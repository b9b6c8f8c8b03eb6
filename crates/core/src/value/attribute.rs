use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A storage item: attribute name to typed storage value.
pub type Item = HashMap<String, AttributeValue>;

/// A typed attribute value as the storage service represents it.
///
/// Numbers travel as decimal text, as the service does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    B(Vec<u8>),
    Bool(bool),
    Null(bool),
    L(Vec<AttributeValue>),
    M(HashMap<String, AttributeValue>),
    Ss(Vec<String>),
    Ns(Vec<String>),
    Bs(Vec<Vec<u8>>),
}

impl AttributeValue {
    /// Returns the string payload if this is an `S`.
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number payload parsed as `f64` if this is an `N`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::N(n) => n.parse().ok(),
            _ => None,
        }
    }
}
