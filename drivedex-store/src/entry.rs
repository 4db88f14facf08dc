//! Entry record types: what goes into the index and what comes back out.

use drivedex_types::{
    ChangeStamp, EntryId, GroupId, SenderId, TransitId, UniqueId, UnixMillis,
};

/// A new entry to insert into the index.
///
/// The store assigns the creation timestamp; the modification stamp stays
/// unset until the first update.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// The entry identifier. In creation-order stores this doubles as the
    /// sort key, so it should be minted with [`EntryId::new`].
    pub id: EntryId,
    /// Externally issued unique id. Unique store-wide when present.
    pub unique_id: Option<UniqueId>,
    /// Transit id. Unique store-wide when present.
    pub transit_id: Option<TransitId>,
    /// Application-defined file type.
    pub file_type: i32,
    /// Application-defined data type.
    pub data_type: i32,
    /// Who sent this entry, if anyone.
    pub sender: Option<SenderId>,
    /// Optional grouping, e.g. a thread or an album.
    pub group_id: Option<GroupId>,
    /// User-supplied date, independent of creation time.
    pub user_date: UnixMillis,
    /// Security group required to see this entry.
    pub security_group: i32,
    /// Archival status bucket.
    pub archival_status: i32,
}

impl NewEntry {
    /// A minimal entry with the given id; remaining fields take neutral
    /// defaults and can be set with struct update syntax.
    #[must_use]
    pub fn with_id(id: EntryId) -> Self {
        Self {
            id,
            unique_id: None,
            transit_id: None,
            file_type: 0,
            data_type: 0,
            sender: None,
            group_id: None,
            user_date: UnixMillis(0),
            security_group: 0,
            archival_status: 0,
        }
    }
}

/// A stored entry as read back from the index.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRecord {
    pub id: EntryId,
    pub unique_id: Option<UniqueId>,
    pub transit_id: Option<TransitId>,
    pub file_type: i32,
    pub data_type: i32,
    pub sender: Option<SenderId>,
    pub group_id: Option<GroupId>,
    pub user_date: UnixMillis,
    pub security_group: i32,
    pub archival_status: i32,
    /// When the entry was inserted (store-assigned).
    pub created: UnixMillis,
    /// Stamp of the most recent update; `None` until the first mutation.
    pub modified: Option<ChangeStamp>,
}

/// Field changes for an update. Absent fields are left untouched.
///
/// The entry id and transit id are immutable and cannot appear here.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub unique_id: Option<UniqueId>,
    pub file_type: Option<i32>,
    pub data_type: Option<i32>,
    pub sender: Option<SenderId>,
    pub group_id: Option<GroupId>,
    pub user_date: Option<UnixMillis>,
    pub security_group: Option<i32>,
    pub archival_status: Option<i32>,
}

impl EntryPatch {
    /// A patch that changes nothing (the update still advances the
    /// modification stamp).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}
