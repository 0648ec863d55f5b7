//! Keyset pagination cursors.
//!
//! A cursor names a position in a list ordered by `(created_at, id)`. It is
//! serialized as URL-safe base64 of `{millis}:{uuid}` so clients treat it as
//! an opaque token.
//!
//! Cursors carry millisecond precision only. Every timestamp that participates
//! in keyset ordering must be stored truncated with [`truncate_to_millis`],
//! otherwise the TEXT comparison SQLite performs will skip or repeat rows at
//! page boundaries.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("invalid cursor format")]
    InvalidFormat,
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid timestamp in cursor")]
    InvalidTimestamp,
    #[error("invalid UUID in cursor")]
    InvalidUuid,
}

/// Position in a `(created_at, id)` ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.created_at.timestamp_millis(), self.id);
        URL_SAFE_NO_PAD.encode(raw.as_bytes())
    }

    pub fn decode(encoded: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded)?;
        let raw = String::from_utf8(bytes).map_err(|_| CursorError::InvalidFormat)?;

        // UUIDs never contain ':'
        let (millis, id) = raw.split_once(':').ok_or(CursorError::InvalidFormat)?;

        let millis: i64 = millis.parse().map_err(|_| CursorError::InvalidTimestamp)?;
        let created_at =
            DateTime::from_timestamp_millis(millis).ok_or(CursorError::InvalidTimestamp)?;
        let id = Uuid::parse_str(id).map_err(|_| CursorError::InvalidUuid)?;

        Ok(Self { created_at, id })
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for Cursor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cursor::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Which side of the cursor to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
    /// Continue past the cursor in list order.
    #[default]
    Forward,
    /// Return the page that precedes the cursor.
    Backward,
}

impl CursorDirection {
    /// Keyset comparison operator and ORDER BY direction for a newest-first
    /// list. Backward pages are read oldest-first from the cursor and flipped
    /// back into list order afterwards.
    pub fn keyset_sql(self) -> (&'static str, &'static str) {
        match self {
            CursorDirection::Forward => ("<", "DESC"),
            CursorDirection::Backward => (">", "ASC"),
        }
    }
}

/// Cursors handed back with a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageCursors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Cursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Cursor>,
}

impl PageCursors {
    /// Derive next/prev cursors for a page already arranged in list order.
    ///
    /// `cursor` is the cursor the page was requested with; its presence means
    /// the caller is not on the first page in that direction.
    pub fn from_items<T, F>(
        items: &[T],
        has_more: bool,
        direction: CursorDirection,
        cursor: Option<&Cursor>,
        get_cursor: F,
    ) -> Self
    where
        F: Fn(&T) -> Cursor,
    {
        let (Some(first), Some(last)) = (items.first(), items.last()) else {
            return Self::default();
        };
        let first = get_cursor(first);
        let last = get_cursor(last);

        match direction {
            CursorDirection::Forward => Self {
                next: has_more.then_some(last),
                prev: cursor.map(|_| first),
            },
            CursorDirection::Backward => Self {
                next: cursor.map(|_| last),
                prev: has_more.then_some(first),
            },
        }
    }
}

#[cfg(feature = "database-sqlite")]
pub fn cursor_from_row(created_at: DateTime<Utc>, id: Uuid) -> Cursor {
    Cursor::new(created_at, id)
}

/// Drop sub-millisecond precision so stored timestamps match decoded cursors.
pub fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize) -> Vec<Cursor> {
        (0..n)
            .map(|_| Cursor::new(truncate_to_millis(Utc::now()), Uuid::new_v4()))
            .collect()
    }

    #[test]
    fn test_keyset_sql_reads_backward_pages_oldest_first() {
        assert_eq!(CursorDirection::Forward.keyset_sql(), ("<", "DESC"));
        assert_eq!(CursorDirection::Backward.keyset_sql(), (">", "ASC"));
    }

    #[test]
    fn test_decode_recovers_millis_and_id() {
        let cursor = Cursor::new(Utc::now(), Uuid::new_v4());
        let decoded = Cursor::decode(&cursor.encode()).unwrap();

        assert_eq!(decoded.created_at, truncate_to_millis(cursor.created_at));
        assert_eq!(decoded.id, cursor.id);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            Cursor::decode("%%%"),
            Err(CursorError::Base64(_))
        ));
        assert!(matches!(
            Cursor::decode(&URL_SAFE_NO_PAD.encode(b"no-separator")),
            Err(CursorError::InvalidFormat)
        ));
        assert!(matches!(
            Cursor::decode(&URL_SAFE_NO_PAD.encode(
                b"yesterday:00000000-0000-0000-0000-000000000000"
            )),
            Err(CursorError::InvalidTimestamp)
        ));
        assert!(matches!(
            Cursor::decode(&URL_SAFE_NO_PAD.encode(b"1700000000000:abc")),
            Err(CursorError::InvalidUuid)
        ));
    }

    #[test]
    fn test_cursor_is_json_string() {
        let cursor = Cursor::new(truncate_to_millis(Utc::now()), Uuid::new_v4());
        let json = serde_json::to_string(&cursor).unwrap();
        assert_eq!(json, format!("\"{}\"", cursor.encode()));

        let back: Cursor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cursor);
    }

    #[test]
    fn test_direction_serde() {
        let d: CursorDirection = serde_json::from_str("\"backward\"").unwrap();
        assert_eq!(d, CursorDirection::Backward);
        assert_eq!(CursorDirection::default(), CursorDirection::Forward);
    }

    #[test]
    fn test_page_cursors_forward() {
        let items = page(3);
        let requested = Cursor::new(Utc::now(), Uuid::new_v4());

        let first_page =
            PageCursors::from_items(&items, true, CursorDirection::Forward, None, Clone::clone);
        assert_eq!(first_page.next.as_ref(), items.last());
        assert!(first_page.prev.is_none());

        let last_page = PageCursors::from_items(
            &items,
            false,
            CursorDirection::Forward,
            Some(&requested),
            Clone::clone,
        );
        assert!(last_page.next.is_none());
        assert_eq!(last_page.prev.as_ref(), items.first());
    }

    #[test]
    fn test_page_cursors_backward() {
        let items = page(2);
        let requested = Cursor::new(Utc::now(), Uuid::new_v4());

        let cursors = PageCursors::from_items(
            &items,
            true,
            CursorDirection::Backward,
            Some(&requested),
            Clone::clone,
        );
        // Rows are already in list order: continue forward after the last
        // row, keep going backward before the first.
        assert_eq!(cursors.next.as_ref(), items.last());
        assert_eq!(cursors.prev.as_ref(), items.first());
    }

    #[test]
    fn test_page_cursors_empty() {
        let cursors = PageCursors::from_items::<Cursor, _>(
            &[],
            true,
            CursorDirection::Forward,
            None,
            Clone::clone,
        );
        assert!(cursors.next.is_none() && cursors.prev.is_none());
    }
}
