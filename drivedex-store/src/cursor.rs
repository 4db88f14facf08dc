//! Cursor state for batch paging sessions.
//!
//! A [`BatchCursor`] is a plain value: queries take one in and hand the
//! updated one back. It also round-trips through an opaque token so API
//! callers can carry paging state across requests.

use crate::error::{StoreError, StoreResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use drivedex_types::{EntryId, UnixMillis};
use serde::{Deserialize, Serialize};

/// Position state for a batch paging session.
///
/// All fields are optional; the default value is a fresh cursor with no
/// bounds. The fields track three independent things:
///
/// - `paging` (+ `user_date_paging` under user-date ordering): the sort key
///   of the last row emitted, used as the exclusive continuation point.
/// - `stop_at` (+ `user_date_stop`): the fixed edge of the browsable
///   snapshot. The default continuation path never scans past it; rows
///   beyond it only become visible through the auto query's catch-up.
/// - `next_boundary`: the newest sort key the session has observed, waiting
///   to become the stop boundary once the current window drains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCursor {
    /// Exclusive continuation point: the last row returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<EntryId>,

    /// User date of the last row returned, carried when the session orders
    /// by user date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_date_paging: Option<UnixMillis>,

    /// Fixed snapshot edge; the scan does not continue past this row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_at: Option<EntryId>,

    /// User date paired with `stop_at` under user-date ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_date_stop: Option<UnixMillis>,

    /// Newest sort key observed by the session, promoted to `stop_at` when
    /// the current window drains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_boundary: Option<EntryId>,
}

impl BatchCursor {
    /// A fresh cursor with no bounds. The first auto-query call establishes
    /// the snapshot edge from whichever end of the data it touches first.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes paging as of an arbitrary entry id, with no stop boundary.
    ///
    /// The next call continues strictly past `id` in whichever direction it
    /// asks for; nothing constrains how far the scan may run.
    #[must_use]
    pub fn start_at(id: EntryId) -> Self {
        Self { paging: Some(id), ..Self::default() }
    }

    /// Resumes paging as of an instant.
    ///
    /// With `by_user_date` false the instant maps onto the creation-ordered
    /// id axis; with it true the cursor is positioned on the user-date axis
    /// instead (for queries ordering by user date).
    #[must_use]
    pub fn start_at_time(at: UnixMillis, by_user_date: bool) -> Self {
        if by_user_date {
            Self {
                paging: Some(EntryId::from_bytes([0u8; 16])),
                user_date_paging: Some(at),
                ..Self::default()
            }
        } else {
            Self {
                paging: Some(EntryId::floor_from_unix_ms(at.as_i64().max(0) as u64)),
                ..Self::default()
            }
        }
    }

    /// Fixes the stop boundary to an entry id before any row has been read,
    /// bounding the scan to everything strictly newer (or older) than it.
    #[must_use]
    pub fn stop_at_boundary(id: EntryId) -> Self {
        Self { stop_at: Some(id), ..Self::default() }
    }

    /// Fixes the stop boundary to an instant, on the creation-ordered id
    /// axis or the user-date axis.
    #[must_use]
    pub fn stop_at_time(at: UnixMillis, by_user_date: bool) -> Self {
        if by_user_date {
            Self {
                stop_at: Some(EntryId::from_bytes([0u8; 16])),
                user_date_stop: Some(at),
                ..Self::default()
            }
        } else {
            Self {
                stop_at: Some(EntryId::floor_from_unix_ms(at.as_i64().max(0) as u64)),
                ..Self::default()
            }
        }
    }

    /// Serializes the cursor to an opaque token.
    ///
    /// The encoding is internal; only the round-trip is contractual.
    #[must_use]
    pub fn to_token(&self) -> String {
        let json = serde_json::to_vec(self).expect("cursor state serializes");
        BASE64.encode(json)
    }

    /// Restores a cursor from a token produced by [`BatchCursor::to_token`].
    ///
    /// An empty token yields the fresh cursor. A malformed token is an
    /// error; the engine never silently substitutes a fresh cursor.
    pub fn from_token(token: &str) -> StoreResult<Self> {
        if token.is_empty() {
            return Ok(Self::default());
        }
        let bytes = BASE64
            .decode(token)
            .map_err(|e| StoreError::CursorToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::CursorToken(e.to_string()))
    }
}
