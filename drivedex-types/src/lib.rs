//! Core type definitions for DriveDex.
//!
//! This crate defines the fundamental types used by the drive index:
//! - Entry and membership identifiers (UUID v7 for time-ordered entry ids,
//!   UUID v4 for externally issued ids)
//! - The monotonic change stamp used by the modification feed
//! - User-date and range primitives used by the filter predicate
//!
//! Storage and query logic belong in `drivedex-store`, not here.

mod ids;
mod stamp;
mod time;

pub use ids::{AclMemberId, EntryId, GroupId, SenderId, TagId, TransitId, UniqueId};
pub use stamp::ChangeStamp;
pub use time::{SecurityRange, TimeRange, UnixMillis};
