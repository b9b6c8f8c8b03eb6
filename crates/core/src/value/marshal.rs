//! Marshaling between storage-ready values and typed storage attributes.
//!
//! Coercion (see [`crate::coercion`]) turns application values into storage-ready
//! primitives; this module maps those primitives onto [`AttributeValue`]s and back.
//! Temporal values must be coerced before they can be marshaled.

use std::collections::{BTreeMap, HashMap};

use crate::coercion::CoercionError;

use super::{AttributeValue, Value};

/// Converts a storage-ready value into a typed storage attribute.
pub fn to_attribute_value(attribute: &str, value: &Value) -> Result<AttributeValue, CoercionError> {
    let not_storable = || CoercionError::NotStorable {
        attribute: attribute.to_string(),
        found: value.type_name(),
    };

    Ok(match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Int(i) => AttributeValue::N(i.to_string()),
        Value::Float(f) if f.is_finite() => AttributeValue::N(f.to_string()),
        Value::Float(_) => return Err(not_storable()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Binary(b) => AttributeValue::B(b.clone()),
        Value::Stream(c) => AttributeValue::B(c.get_ref().clone()),
        Value::List(items) => AttributeValue::L(
            items
                .iter()
                .map(|v| to_attribute_value(attribute, v))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), to_attribute_value(attribute, v)?)))
                .collect::<Result<HashMap<_, _>, CoercionError>>()?,
        ),
        Value::Timestamp(_) | Value::Date(_) | Value::DateTime(_) => return Err(not_storable()),
    })
}

/// Converts a typed storage attribute into a storage-ready value.
pub fn from_attribute_value(value: &AttributeValue) -> Result<Value, CoercionError> {
    Ok(match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::B(b) => Value::Binary(b.clone()),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::List(
            items
                .iter()
                .map(from_attribute_value)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => Value::Map(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), from_attribute_value(v)?)))
                .collect::<Result<BTreeMap<_, _>, CoercionError>>()?,
        ),
        AttributeValue::Ss(items) => {
            Value::List(items.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(items) => Value::List(
            items
                .iter()
                .map(|n| parse_number(n))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Bs(items) => {
            Value::List(items.iter().cloned().map(Value::Binary).collect())
        }
    })
}

/// Parses the decimal text of a stored number.
///
/// Integer literals that fit `i64` become `Int`, everything else `Float`.
pub fn parse_number(text: &str) -> Result<Value, CoercionError> {
    let integral = !text.contains(['.', 'e', 'E']);
    if integral {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Int(i));
        }
    }
    text.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| CoercionError::InvalidNumber(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_integer_number_reads_back_as_int() {
        let attr = to_attribute_value("n", &Value::Int(42)).unwrap();
        assert_eq!(attr, AttributeValue::N("42".to_string()));
        assert_eq!(from_attribute_value(&attr).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_float_keeps_full_precision() {
        let value = Value::Float(1_718_000_000.123_456_7);
        let attr = to_attribute_value("n", &value).unwrap();
        assert_eq!(from_attribute_value(&attr).unwrap(), value);
    }

    #[test]
    fn test_non_finite_float_is_not_storable() {
        let result = to_attribute_value("score", &Value::Float(f64::NAN));
        assert_eq!(
            result,
            Err(CoercionError::NotStorable {
                attribute: "score".to_string(),
                found: "float",
            })
        );
    }

    #[test]
    fn test_uncoerced_timestamp_is_not_storable() {
        let result = to_attribute_value("at", &Value::Timestamp(Utc::now()));
        assert!(matches!(result, Err(CoercionError::NotStorable { .. })));
    }

    #[test]
    fn test_string_sets_read_as_lists() {
        let attr = AttributeValue::Ss(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            from_attribute_value(&attr).unwrap(),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn test_nested_map_round_trip() {
        let mut inner = BTreeMap::new();
        inner.insert("x".to_string(), Value::Int(1));
        inner.insert("y".to_string(), Value::List(vec![Value::from("z")]));
        let value = Value::Map(inner);

        let attr = to_attribute_value("m", &value).unwrap();
        assert_eq!(from_attribute_value(&attr).unwrap(), value);
    }

    #[test]
    fn test_invalid_number_text() {
        assert_eq!(
            parse_number("twelve"),
            Err(CoercionError::InvalidNumber("twelve".to_string()))
        );
    }

    #[test]
    fn test_large_integer_falls_back_to_float() {
        assert_eq!(
            parse_number("100000000000000000000").unwrap(),
            Value::Float(1e20)
        );
    }
}
