#![forbid(unsafe_code)]

use super::StoreError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Keyset position for the `new`-queue reader. Encoded opaquely so callers
/// cannot meaningfully construct or edit one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub captured_at: String,
    pub id: i64,
}

pub fn encode_cursor(cursor: &PageCursor) -> String {
    let payload = serde_json::json!({
        "captured_at": cursor.captured_at,
        "id": cursor.id,
    });
    STANDARD.encode(payload.to_string())
}

pub fn decode_cursor(raw: &str) -> Result<PageCursor, StoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidCursor);
    }
    let bytes = STANDARD
        .decode(trimmed)
        .map_err(|_| StoreError::InvalidCursor)?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| StoreError::InvalidCursor)?;
    let captured_at = value
        .get("captured_at")
        .and_then(|v| v.as_str())
        .ok_or(StoreError::InvalidCursor)?
        .to_string();
    let id = value
        .get("id")
        .and_then(|v| v.as_i64())
        .ok_or(StoreError::InvalidCursor)?;
    Ok(PageCursor { captured_at, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cursor = PageCursor {
            captured_at: "2026-02-05T10:00:00.000Z".to_string(),
            id: 42,
        };
        let encoded = encode_cursor(&cursor);
        assert_eq!(decode_cursor(&encoded).expect("decode"), cursor);
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_cursor("").is_err());
        assert!(decode_cursor("   ").is_err());
        assert!(decode_cursor("not-base64!!").is_err());
        let not_json = STANDARD.encode("plain text");
        assert!(decode_cursor(&not_json).is_err());
        let missing_id = STANDARD.encode(r#"{"captured_at":"x"}"#);
        assert!(decode_cursor(&missing_id).is_err());
    }
}
