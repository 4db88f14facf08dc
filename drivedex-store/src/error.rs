//! Error types for the drive store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store and query operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A uniqueness constraint was violated; nothing was written.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    /// Entry not found.
    #[error("entry not found: {0}")]
    NotFound(drivedex_types::EntryId),

    /// A cursor token could not be decoded.
    #[error("invalid cursor token: {0}")]
    CursorToken(String),

    /// A cursor is missing state the requested ordering needs.
    #[error("invalid cursor: {0}")]
    InvalidCursor(&'static str),

    /// Page size must be at least one.
    #[error("page size must be at least 1")]
    InvalidPageSize,

    /// A stored row held data the store could not interpret.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}
