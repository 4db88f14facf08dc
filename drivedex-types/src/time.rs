//! User-date and range primitives used by the filter predicate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A caller-supplied instant in milliseconds since the Unix epoch.
///
/// Independent of when the entry was created; this is the date the user
/// attached to the content (a photo's capture date, a message's send date).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnixMillis(pub i64);

impl UnixMillis {
    /// The current wall time.
    #[must_use]
    pub fn now() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_millis() as i64;
        Self(ms)
    }

    /// Returns the raw millisecond value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UnixMillis {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

impl fmt::Display for UnixMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inclusive user-date range.
///
/// A range with `start > end` is not an error; it simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: UnixMillis,
    pub end: UnixMillis,
}

impl TimeRange {
    /// Creates an inclusive range.
    #[must_use]
    pub const fn new(start: UnixMillis, end: UnixMillis) -> Self {
        Self { start, end }
    }

    /// Returns true if the instant falls within the range.
    #[must_use]
    pub fn contains(&self, at: UnixMillis) -> bool {
        self.start <= at && at <= self.end
    }
}

/// An inclusive range of security-group buckets.
///
/// A range with `start > end` matches nothing, which is how a caller asks
/// for pure access-list filtering in the scope-or-ACL predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRange {
    pub start: i32,
    pub end: i32,
}

impl SecurityRange {
    /// Creates an inclusive range.
    #[must_use]
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// A range matching every security group.
    #[must_use]
    pub const fn all() -> Self {
        Self { start: i32::MIN, end: i32::MAX }
    }

    /// A range that can match nothing, for pure access-list queries.
    #[must_use]
    pub const fn none() -> Self {
        Self { start: 0, end: -1 }
    }

    /// Returns true if the bucket falls within the range.
    #[must_use]
    pub fn contains(&self, group: i32) -> bool {
        self.start <= group && group <= self.end
    }
}
