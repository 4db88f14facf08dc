//! Identifier types used throughout the DriveDex core.
//!
//! Entry ids use UUID v7 so the identifier itself is the creation-order sort
//! key: the leading 48 bits are the unix millisecond and the remaining bits
//! are a monotonic counter plus randomness, so ids minted by one process sort
//! in mint order even within a single millisecond.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};
use uuid::timestamp::context::ContextV7;
use uuid::{Timestamp, Uuid};

static V7_CONTEXT: OnceLock<Mutex<ContextV7>> = OnceLock::new();

/// Unique identifier for a drive entry.
///
/// UUID v7: time-ordered by construction. Comparing two entry ids compares
/// their creation instants, with the embedded counter breaking ties for ids
/// minted in the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Mints a new entry id at the current instant.
    #[must_use]
    pub fn new() -> Self {
        let ctx = V7_CONTEXT.get_or_init(|| Mutex::new(ContextV7::new()));
        let guard = ctx.lock().expect("v7 context mutex poisoned");
        Self(Uuid::new_v7(Timestamp::now(&*guard)))
    }

    /// Creates an entry id from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the raw 16 bytes (the creation-order sort key).
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Creates an entry id from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// The smallest possible entry id for the given unix millisecond.
    ///
    /// Sorts at or before every id actually minted in that millisecond, so it
    /// can stand in for "the instant `ms`" as a cursor position or boundary.
    #[must_use]
    pub fn floor_from_unix_ms(ms: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[..6].copy_from_slice(&ms.to_be_bytes()[2..8]);
        bytes[6] = 0x70; // version 7, zero counter bits
        bytes[8] = 0x80; // RFC variant, zero counter bits
        Self(Uuid::from_bytes(bytes))
    }

    /// Parses an entry id from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Defines a 128-bit identifier wrapper with no ordering significance.
macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an id from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Returns the raw 16 bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }

            /// Creates an id from raw bytes.
            #[must_use]
            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

opaque_id! {
    /// Identifier of a tag an entry can be a member of.
    TagId
}

opaque_id! {
    /// Identifier of an access-list member (a circle or identity) an entry
    /// can be shared with.
    AclMemberId
}

opaque_id! {
    /// Optional grouping id, e.g. a conversation thread or an album.
    GroupId
}

opaque_id! {
    /// Globally unique transit id assigned when an entry travels between
    /// stores. Unique store-wide when present.
    TransitId
}

opaque_id! {
    /// Externally issued client unique id. Unique store-wide when present.
    UniqueId
}

/// Opaque identifier of whoever sent an entry.
///
/// The store never interprets these bytes; equality is the only operation
/// the filter predicate needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(Vec<u8>);

impl SenderId {
    /// Creates a sender id from raw bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for SenderId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for SenderId {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}
