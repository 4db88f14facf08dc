#![allow(dead_code)]

use drivedex_store::{DriveStore, NewEntry, QueryFilters, StoreOptions, StoreOrdering};
use drivedex_types::{AclMemberId, EntryId, SecurityRange, SenderId, TagId, UnixMillis};

/// An in-memory creation-time-ordered store.
pub fn open_store() -> DriveStore {
    DriveStore::open_in_memory(StoreOptions::new(StoreOrdering::CreationTime)).unwrap()
}

/// An in-memory insertion-sequence-ordered store.
pub fn open_seq_store() -> DriveStore {
    DriveStore::open_in_memory(StoreOptions::new(StoreOrdering::InsertionSeq)).unwrap()
}

/// Inserts a minimal entry in the given security group.
pub fn add(store: &DriveStore, id: EntryId, security_group: i32) {
    add_entry(store, id, security_group, UnixMillis(0), &[], &[]);
}

/// Inserts an entry with the fields the query tests care about.
pub fn add_entry(
    store: &DriveStore,
    id: EntryId,
    security_group: i32,
    user_date: UnixMillis,
    tags: &[TagId],
    acl: &[AclMemberId],
) {
    let entry = NewEntry {
        file_type: 1,
        data_type: 1,
        sender: Some(SenderId::from("sender.one")),
        user_date,
        security_group,
        ..NewEntry::with_id(id)
    };
    store.insert_entry(&entry, tags, acl).unwrap();
}

/// Filters matching every security group and nothing else.
pub fn all_scoped() -> QueryFilters {
    QueryFilters::scoped(SecurityRange::new(0, 1000))
}

/// Mints `n` entry ids, oldest first.
pub fn mint_ids(n: usize) -> Vec<EntryId> {
    (0..n).map(|_| EntryId::new()).collect()
}
