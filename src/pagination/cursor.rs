//! # Keyset Cursor Codec
//!
//! A cursor is the `(created_at, id)` position of the last item of a page,
//! rendered as `"<rfc3339 timestamp>|<uuid>"` and then URL-safe base64
//! encoded. Cursors are never persisted.

use crate::constants::CURSOR_SEPARATOR;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Encodes with padding, decodes with or without it
const CURSOR_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("cursor is not valid base64: {0}")]
    Encoding(String),

    #[error("cursor is not valid UTF-8")]
    Utf8,

    #[error("cursor is missing the '|' separator")]
    MissingSeparator,

    #[error("cursor timestamp is invalid: {0}")]
    Timestamp(String),

    #[error("cursor id is invalid: {0}")]
    Id(String),
}

/// A position in the (created_at desc, id desc) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeysetPosition {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl KeysetPosition {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    /// True when a row at `(created_at, id)` comes strictly after this position:
    /// older, or equally old with a smaller id.
    pub fn precedes(&self, created_at: DateTime<Utc>, id: Uuid) -> bool {
        created_at < self.created_at || (created_at == self.created_at && id < self.id)
    }
}

/// Opaque pagination token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn encode(position: &KeysetPosition) -> Self {
        let raw = format!(
            "{}{}{}",
            position
                .created_at
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            CURSOR_SEPARATOR,
            position.id
        );
        Self(CURSOR_ENGINE.encode(raw.as_bytes()))
    }

    pub fn decode(&self) -> Result<KeysetPosition, CursorError> {
        Self::decode_str(&self.0)
    }

    pub fn decode_str(cursor: &str) -> Result<KeysetPosition, CursorError> {
        let bytes = CURSOR_ENGINE
            .decode(cursor.trim())
            .map_err(|e| CursorError::Encoding(e.to_string()))?;
        let decoded = String::from_utf8(bytes).map_err(|_| CursorError::Utf8)?;

        let (timestamp, id) = decoded
            .split_once(CURSOR_SEPARATOR)
            .ok_or(CursorError::MissingSeparator)?;

        let created_at = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| CursorError::Timestamp(e.to_string()))?
            .with_timezone(&Utc);
        let id = Uuid::parse_str(id).map_err(|e| CursorError::Id(e.to_string()))?;

        Ok(KeysetPosition::new(created_at, id))
    }

    /// Absent or blank input means "start from the beginning"
    pub fn decode_optional(cursor: Option<&str>) -> Result<Option<KeysetPosition>, CursorError> {
        match cursor {
            Some(raw) if !raw.trim().is_empty() => Self::decode_str(raw).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&KeysetPosition> for Cursor {
    fn from(position: &KeysetPosition) -> Self {
        Self::encode(position)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn position() -> KeysetPosition {
        KeysetPosition::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
            Uuid::parse_str("6f1c2a5e-8d3b-4f7a-9c1e-2b3d4e5f6a7b").unwrap(),
        )
    }

    #[test]
    fn test_encoded_cursor_is_url_safe() {
        let cursor = Cursor::encode(&position());
        assert!(cursor
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '='));
    }

    #[test]
    fn test_decode_accepts_unpadded_input() {
        let cursor = Cursor::encode(&position());
        let unpadded = cursor.as_str().trim_end_matches('=');
        assert_eq!(Cursor::decode_str(unpadded).unwrap(), position());
    }

    #[test]
    fn test_decode_optional_treats_blank_as_absent() {
        assert_eq!(Cursor::decode_optional(None).unwrap(), None);
        assert_eq!(Cursor::decode_optional(Some("   ")).unwrap(), None);
    }

    #[test]
    fn test_malformed_cursors_are_rejected() {
        assert!(matches!(
            Cursor::decode_str("%%%not-base64%%%"),
            Err(CursorError::Encoding(_))
        ));

        let no_separator = CURSOR_ENGINE.encode(b"2024-01-15T10:00:00Z");
        assert_eq!(
            Cursor::decode_str(&no_separator),
            Err(CursorError::MissingSeparator)
        );

        let bad_time = CURSOR_ENGINE.encode(format!("yesterday|{}", Uuid::nil()).as_bytes());
        assert!(matches!(
            Cursor::decode_str(&bad_time),
            Err(CursorError::Timestamp(_))
        ));

        let bad_id = CURSOR_ENGINE.encode(b"2024-01-15T10:00:00Z|not-a-uuid");
        assert!(matches!(Cursor::decode_str(&bad_id), Err(CursorError::Id(_))));
    }

    #[test]
    fn test_precedes_breaks_ties_by_id() {
        let pos = position();
        let smaller_id = Uuid::nil();
        let larger_id = Uuid::from_u128(u128::MAX);

        assert!(pos.precedes(pos.created_at, smaller_id));
        assert!(!pos.precedes(pos.created_at, larger_id));
        assert!(!pos.precedes(pos.created_at, pos.id));
        assert!(pos.precedes(pos.created_at - chrono::Duration::microseconds(1), larger_id));
    }

    proptest! {
        #[test]
        fn cursor_round_trips(
            secs in 0i64..4_102_444_800,
            micros in 0u32..1_000_000,
            id_bytes in any::<[u8; 16]>(),
        ) {
            let created_at = Utc.timestamp_opt(secs, micros * 1_000).unwrap();
            let position = KeysetPosition::new(created_at, Uuid::from_bytes(id_bytes));
            let decoded = Cursor::encode(&position).decode().unwrap();
            prop_assert_eq!(decoded, position);
        }
    }
}
