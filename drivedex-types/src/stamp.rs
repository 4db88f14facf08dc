//! The modification stamp: a monotonic (millisecond, sequence) pair.
//!
//! Every update to an entry is stamped with one of these. The sequence
//! component disambiguates writes that land in the same millisecond, so the
//! modification feed has a total order to page over.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of low bits the sequence occupies in the encoded form.
const SEQ_BITS: u32 = 16;
const SEQ_MAX: u16 = u16::MAX;

/// A modification stamp.
///
/// Consists of:
/// - `wall_time`: milliseconds since the Unix epoch
/// - `seq`: sequence counter for stamps issued in the same millisecond
///
/// Stamps issued through [`ChangeStamp::tick`] are strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeStamp {
    wall_time: u64,
    seq: u16,
}

impl ChangeStamp {
    /// The zero stamp, older than any stamp a store ever issues.
    pub const ZERO: Self = Self { wall_time: 0, seq: 0 };

    /// Creates a stamp at the current wall time with a zero sequence.
    #[must_use]
    pub fn now() -> Self {
        let wall_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_millis() as u64;

        Self { wall_time, seq: 0 }
    }

    /// Creates a stamp from components.
    #[must_use]
    pub const fn new(wall_time: u64, seq: u16) -> Self {
        Self { wall_time, seq }
    }

    /// Returns the wall time component in milliseconds.
    #[must_use]
    pub const fn wall_time(&self) -> u64 {
        self.wall_time
    }

    /// Returns the sequence counter.
    #[must_use]
    pub const fn seq(&self) -> u16 {
        self.seq
    }

    /// Generates the next stamp, strictly greater than `self`.
    ///
    /// Uses the current wall time when it has advanced; otherwise bumps the
    /// sequence counter (rolling into the next millisecond if the counter is
    /// exhausted).
    #[must_use]
    pub fn tick(&self) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_millis() as u64;

        if now > self.wall_time {
            Self { wall_time: now, seq: 0 }
        } else if self.seq < SEQ_MAX {
            Self { wall_time: self.wall_time, seq: self.seq + 1 }
        } else {
            Self { wall_time: self.wall_time + 1, seq: 0 }
        }
    }

    /// Encodes the stamp as a single integer preserving its order.
    ///
    /// The wall time occupies the high bits, the sequence the low 16, so
    /// integer comparison of encoded stamps matches stamp comparison.
    #[must_use]
    pub const fn encode(&self) -> i64 {
        ((self.wall_time as i64) << SEQ_BITS) | self.seq as i64
    }

    /// Decodes a stamp previously produced by [`ChangeStamp::encode`].
    #[must_use]
    pub const fn decode(value: i64) -> Self {
        Self {
            wall_time: (value >> SEQ_BITS) as u64,
            seq: (value & SEQ_MAX as i64) as u16,
        }
    }
}

impl Default for ChangeStamp {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialOrd for ChangeStamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChangeStamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.wall_time.cmp(&other.wall_time) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            other => other,
        }
    }
}

impl fmt::Display for ChangeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.wall_time, self.seq)
    }
}
