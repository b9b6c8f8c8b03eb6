//! Opaque continuation cursors.
//!
//! A cursor is a `last_evaluated_key` serialized to JSON and encoded as URL-safe base64,
//! so it can be handed to remote clients and fed back to resume a query or scan.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::key::ValidationError;
use crate::value::Item;

/// Encodes a continuation key as an opaque cursor string.
pub fn encode_cursor(key: &Item) -> Result<String, ValidationError> {
    let json =
        serde_json::to_vec(key).map_err(|e| ValidationError::InvalidCursor(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a cursor produced by [`encode_cursor`].
pub fn decode_cursor(cursor: &str) -> Result<Item, ValidationError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|e| ValidationError::InvalidCursor(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ValidationError::InvalidCursor(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AttributeValue;

    #[test]
    fn test_cursor_round_trip() {
        let key = Item::from([
            ("thread_id".to_string(), AttributeValue::S("t-1".to_string())),
            ("sent_at".to_string(), AttributeValue::N("1718000000.5".to_string())),
        ]);

        let cursor = encode_cursor(&key).unwrap();

        assert!(!cursor.contains('='));
        assert_eq!(decode_cursor(&cursor), Ok(key));
    }

    #[test]
    fn test_garbage_cursor_is_rejected() {
        assert!(matches!(
            decode_cursor("not a cursor!"),
            Err(ValidationError::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_valid_base64_with_wrong_payload_is_rejected() {
        let cursor = URL_SAFE_NO_PAD.encode(b"[1,2,3]");
        assert!(matches!(
            decode_cursor(&cursor),
            Err(ValidationError::InvalidCursor(_))
        ));
    }
}
