//! Cursor-based pagination for list endpoints.
//!
//! Cursors are base64-encoded UUIDs. Primary keys are v7 (time-ordered),
//! so `WHERE id < cursor ORDER BY id DESC` gives stable newest-first
//! pages without OFFSET scans.

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::ApiError;

/// Opaque pagination cursor (base64-encoded UUID).
#[derive(Debug, Clone)]
pub struct Cursor(Uuid);

impl Cursor {
    pub fn new(id: Uuid) -> Self {
        Cursor(id)
    }

    /// Encode the cursor as a URL-safe base64 string.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0.as_bytes())
    }

    /// Decode a cursor string.
    pub fn decode(s: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .context("Invalid cursor: not valid base64")?;
        let uuid = Uuid::from_slice(&bytes).context("Invalid cursor: not a valid UUID")?;
        Ok(Cursor(uuid))
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

/// Query parameters shared by all list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Page size; clamped to 1..=100, default 25.
    pub limit: Option<i64>,
    /// Cursor returned by a previous page.
    pub after: Option<String>,
}

impl ListParams {
    pub const DEFAULT_LIMIT: i64 = 25;
    pub const MAX_LIMIT: i64 = 100;

    /// Effective page size.
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Decode the `after` cursor, if present. A malformed cursor is a
    /// client error, not a server one.
    pub fn after_id(&self) -> Result<Option<Uuid>, ApiError> {
        match &self.after {
            Some(s) => Ok(Some(
                Cursor::decode(s)
                    .map_err(|_| ApiError::bad_request("Invalid pagination cursor"))?
                    .into_uuid(),
            )),
            None => Ok(None),
        }
    }
}

/// Response envelope for paginated lists.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Build a page from `limit + 1` fetched rows: the extra row signals
    /// another page exists and is not returned.
    pub fn from_rows(mut rows: Vec<T>, limit: i64, id_of: impl Fn(&T) -> Uuid) -> Self {
        let has_more = rows.len() as i64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }
        let next_cursor = if has_more {
            rows.last().map(|row| Cursor::new(id_of(row)).encode())
        } else {
            None
        };
        Page {
            items: rows,
            next_cursor,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_roundtrip() {
        let id = Uuid::now_v7();
        let encoded = Cursor::new(id).encode();
        let decoded = Cursor::decode(&encoded).unwrap();
        assert_eq!(decoded.into_uuid(), id);
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!(Cursor::decode("!!!not-base64!!!").is_err());
        // Valid base64 but wrong length
        assert!(Cursor::decode("aGVsbG8").is_err());
    }

    #[test]
    fn test_limit_clamping() {
        let params = ListParams {
            limit: Some(1000),
            after: None,
        };
        assert_eq!(params.limit(), ListParams::MAX_LIMIT);

        let params = ListParams {
            limit: Some(0),
            after: None,
        };
        assert_eq!(params.limit(), 1);

        let params = ListParams::default();
        assert_eq!(params.limit(), ListParams::DEFAULT_LIMIT);
    }

    #[test]
    fn test_page_from_rows_with_more() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::now_v7()).collect();
        let page = Page::from_rows(ids.clone(), 3, |id| *id);
        assert_eq!(page.items.len(), 3);
        assert!(page.has_more);
        let cursor = page.next_cursor.expect("cursor for full page");
        assert_eq!(Cursor::decode(&cursor).unwrap().into_uuid(), ids[2]);
    }

    #[test]
    fn test_page_from_rows_last_page() {
        let ids: Vec<Uuid> = (0..2).map(|_| Uuid::now_v7()).collect();
        let page = Page::from_rows(ids, 3, |id| *id);
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }
}
