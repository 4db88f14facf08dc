//! SQLite-backed drive index for DriveDex.
//!
//! Indexes immutable-by-key drive entries together with their tag and
//! access-list memberships, and lets callers page through the index while it
//! is concurrently growing:
//!
//! - [`DriveStore::query_batch`] — one bounded scan in either direction,
//!   ordered by entry id or by user date.
//! - [`DriveStore::query_batch_auto`] — the stateful walk: repeated calls
//!   with the returned cursor yield a contiguous, non-overlapping,
//!   newest-first traversal of the store, bridging any rows inserted between
//!   calls.
//! - [`DriveStore::query_modified`] — the change feed, ordered by
//!   modification stamp, for incremental sync.
//!
//! All three share one composable filter predicate ([`QueryFilters`]).
//! Cursors are plain values: queries take a cursor and return the updated
//! one, and [`BatchCursor`] round-trips through an opaque token for use as
//! an API pagination token.

mod cursor;
mod entry;
mod error;
mod filter;
mod query;
mod store;

pub use cursor::BatchCursor;
pub use entry::{EntryPatch, EntryRecord, NewEntry};
pub use error::{StoreError, StoreResult};
pub use filter::QueryFilters;
pub use query::{BatchPage, Direction, ModifiedPage, SortField};
pub use store::{DriveStore, StoreOptions, StoreOrdering};
