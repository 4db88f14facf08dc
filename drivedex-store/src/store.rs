//! The drive store: schema, ordering mode, and entry mutations.
//!
//! One SQLite connection per store, guarded by a mutex. Every mutation that
//! touches more than one table runs in a transaction, so a uniqueness
//! violation anywhere fails the whole operation with nothing written.

use crate::entry::{EntryPatch, EntryRecord, NewEntry};
use crate::error::{StoreError, StoreResult};
use crate::filter::blob;
use drivedex_types::{
    AclMemberId, ChangeStamp, EntryId, GroupId, SenderId, TagId, TransitId, UniqueId, UnixMillis,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Which sort key orders the index. Chosen once when the store is opened and
/// fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOrdering {
    /// Order by the entry id itself (UUID v7, time-sortable by
    /// construction). Newest = greatest id.
    CreationTime,
    /// Order by the store-assigned monotonic row sequence. Newest =
    /// greatest sequence, regardless of what the ids look like.
    InsertionSeq,
}

impl StoreOrdering {
    /// SQL expression for the sort key of the aliased `entries e` row.
    pub(crate) fn sort_expr(self) -> &'static str {
        match self {
            Self::CreationTime => "e.id",
            Self::InsertionSeq => "e.seq",
        }
    }

    /// SQL expression resolving a cursor entry id (bound as one parameter)
    /// to a comparable sort key. A cursor id that no longer resolves to a
    /// row compares as NULL in insertion-sequence mode and so matches
    /// nothing, which is the safe outcome for a stale cursor.
    pub(crate) fn key_expr(self) -> &'static str {
        match self {
            Self::CreationTime => "?",
            Self::InsertionSeq => "(SELECT r.seq FROM entries r WHERE r.id = ?)",
        }
    }
}

/// Configuration for opening a store.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// The ordering mode, fixed for the store's lifetime.
    pub ordering: StoreOrdering,
    /// Whether deleting an entry also deletes its tag and ACL memberships.
    pub cascade_delete: bool,
}

impl StoreOptions {
    /// Options with the given ordering and cascading deletes.
    #[must_use]
    pub fn new(ordering: StoreOrdering) -> Self {
        Self { ordering, cascade_delete: true }
    }
}

/// The drive index: one entry table plus tag and access-list membership
/// tables, with the cursor query engine layered on top (see `query.rs`).
pub struct DriveStore {
    pub(crate) conn: Mutex<Connection>,
    pub(crate) ordering: StoreOrdering,
    cascade_delete: bool,
    clock: Mutex<ChangeStamp>,
}

impl DriveStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn, options)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory(options: StoreOptions) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, options)
    }

    fn init(conn: Connection, options: StoreOptions) -> StoreResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS entries (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id BLOB NOT NULL UNIQUE,
                unique_id BLOB UNIQUE,
                transit_id BLOB UNIQUE,
                file_type INTEGER NOT NULL,
                data_type INTEGER NOT NULL,
                sender BLOB,
                group_id BLOB,
                user_date INTEGER NOT NULL,
                security_group INTEGER NOT NULL,
                archival_status INTEGER NOT NULL,
                created INTEGER NOT NULL,
                modified INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_entries_modified ON entries(modified);
            CREATE INDEX IF NOT EXISTS idx_entries_user_date ON entries(user_date, id);

            CREATE TABLE IF NOT EXISTS tag_index (
                entry_id BLOB NOT NULL,
                tag_id BLOB NOT NULL,
                PRIMARY KEY (entry_id, tag_id)
            ) WITHOUT ROWID;
            CREATE INDEX IF NOT EXISTS idx_tag_index_tag ON tag_index(tag_id, entry_id);

            CREATE TABLE IF NOT EXISTS acl_index (
                entry_id BLOB NOT NULL,
                member_id BLOB NOT NULL,
                PRIMARY KEY (entry_id, member_id)
            ) WITHOUT ROWID;
            CREATE INDEX IF NOT EXISTS idx_acl_index_member ON acl_index(member_id, entry_id);
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            ordering: options.ordering,
            cascade_delete: options.cascade_delete,
            clock: Mutex::new(ChangeStamp::ZERO),
        })
    }

    /// Returns the ordering mode this store was opened with.
    #[must_use]
    pub fn ordering(&self) -> StoreOrdering {
        self.ordering
    }

    /// Issues the next modification stamp, strictly greater than every stamp
    /// this store has issued before.
    pub(crate) fn next_stamp(&self) -> ChangeStamp {
        let mut last = self.clock.lock().unwrap();
        let next = last.tick();
        *last = next;
        next
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Inserts an entry with its tag and ACL memberships in one transaction.
    ///
    /// Fails with [`StoreError::Duplicate`] — writing nothing — on a
    /// colliding entry id, unique id, transit id, or a repeated member
    /// within `tags`/`acl`.
    pub fn insert_entry(
        &self,
        entry: &NewEntry,
        tags: &[TagId],
        acl: &[AclMemberId],
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        Self::insert_entry_tx(&tx, entry, tags, acl)?;
        tx.commit()?;
        debug!(id = %entry.id, tags = tags.len(), acl = acl.len(), "inserted entry");
        Ok(())
    }

    /// Inserts many entries in a single transaction, for bulk loads. The
    /// first failure rolls back the whole batch.
    pub fn insert_entries(
        &self,
        batch: &[(NewEntry, Vec<TagId>, Vec<AclMemberId>)],
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        for (entry, tags, acl) in batch {
            Self::insert_entry_tx(&tx, entry, tags, acl)?;
        }
        tx.commit()?;
        debug!(entries = batch.len(), "inserted entry batch");
        Ok(())
    }

    fn insert_entry_tx(
        tx: &Connection,
        entry: &NewEntry,
        tags: &[TagId],
        acl: &[AclMemberId],
    ) -> StoreResult<()> {
        tx.execute(
            "INSERT INTO entries
                 (id, unique_id, transit_id, file_type, data_type, sender, group_id,
                  user_date, security_group, archival_status, created, modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL)",
            params![
                entry.id.as_bytes().as_slice(),
                entry.unique_id.map(|u| u.as_bytes().to_vec()),
                entry.transit_id.map(|t| t.as_bytes().to_vec()),
                entry.file_type,
                entry.data_type,
                entry.sender.as_ref().map(|s| s.as_bytes().to_vec()),
                entry.group_id.map(|g| g.as_bytes().to_vec()),
                entry.user_date.as_i64(),
                entry.security_group,
                entry.archival_status,
                UnixMillis::now().as_i64(),
            ],
        )
        .map_err(|e| map_constraint(e, "entry id, unique id or transit id"))?;

        Self::insert_tags_tx(tx, entry.id, tags)?;
        Self::insert_acl_tx(tx, entry.id, acl)?;
        Ok(())
    }

    fn insert_tags_tx(tx: &Connection, id: EntryId, tags: &[TagId]) -> StoreResult<()> {
        for tag in tags {
            tx.execute(
                "INSERT INTO tag_index (entry_id, tag_id) VALUES (?1, ?2)",
                params![id.as_bytes().as_slice(), tag.as_bytes().as_slice()],
            )
            .map_err(|e| map_constraint(e, "tag membership"))?;
        }
        Ok(())
    }

    fn insert_acl_tx(tx: &Connection, id: EntryId, acl: &[AclMemberId]) -> StoreResult<()> {
        for member in acl {
            tx.execute(
                "INSERT INTO acl_index (entry_id, member_id) VALUES (?1, ?2)",
                params![id.as_bytes().as_slice(), member.as_bytes().as_slice()],
            )
            .map_err(|e| map_constraint(e, "acl membership"))?;
        }
        Ok(())
    }

    /// Applies a field patch and membership deltas, advancing the
    /// modification stamp.
    pub fn update_entry(
        &self,
        id: EntryId,
        patch: &EntryPatch,
        add_tags: &[TagId],
        remove_tags: &[TagId],
        add_acl: &[AclMemberId],
        remove_acl: &[AclMemberId],
    ) -> StoreResult<()> {
        let stamp = self.next_stamp();
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;

        Self::apply_patch_tx(&tx, id, patch, stamp)?;

        for tag in add_tags {
            tx.execute(
                "INSERT OR IGNORE INTO tag_index (entry_id, tag_id) VALUES (?1, ?2)",
                params![id.as_bytes().as_slice(), tag.as_bytes().as_slice()],
            )?;
        }
        for tag in remove_tags {
            tx.execute(
                "DELETE FROM tag_index WHERE entry_id = ?1 AND tag_id = ?2",
                params![id.as_bytes().as_slice(), tag.as_bytes().as_slice()],
            )?;
        }
        for member in add_acl {
            tx.execute(
                "INSERT OR IGNORE INTO acl_index (entry_id, member_id) VALUES (?1, ?2)",
                params![id.as_bytes().as_slice(), member.as_bytes().as_slice()],
            )?;
        }
        for member in remove_acl {
            tx.execute(
                "DELETE FROM acl_index WHERE entry_id = ?1 AND member_id = ?2",
                params![id.as_bytes().as_slice(), member.as_bytes().as_slice()],
            )?;
        }

        tx.commit()?;
        debug!(id = %id, stamp = %stamp, "updated entry");
        Ok(())
    }

    /// Applies a field patch and replaces both membership sets wholesale,
    /// advancing the modification stamp.
    pub fn replace_entry(
        &self,
        id: EntryId,
        patch: &EntryPatch,
        tags: &[TagId],
        acl: &[AclMemberId],
    ) -> StoreResult<()> {
        let stamp = self.next_stamp();
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;

        Self::apply_patch_tx(&tx, id, patch, stamp)?;
        tx.execute(
            "DELETE FROM tag_index WHERE entry_id = ?1",
            params![id.as_bytes().as_slice()],
        )?;
        Self::insert_tags_tx(&tx, id, tags)?;
        tx.execute(
            "DELETE FROM acl_index WHERE entry_id = ?1",
            params![id.as_bytes().as_slice()],
        )?;
        Self::insert_acl_tx(&tx, id, acl)?;

        tx.commit()?;
        debug!(id = %id, stamp = %stamp, "replaced entry");
        Ok(())
    }

    fn apply_patch_tx(
        tx: &Connection,
        id: EntryId,
        patch: &EntryPatch,
        stamp: ChangeStamp,
    ) -> StoreResult<()> {
        let mut sets: Vec<&'static str> = vec!["modified = ?"];
        let mut values: Vec<Value> = vec![Value::from(stamp.encode())];

        if let Some(u) = patch.unique_id {
            sets.push("unique_id = ?");
            values.push(blob(u.as_bytes()));
        }
        if let Some(ft) = patch.file_type {
            sets.push("file_type = ?");
            values.push(Value::from(ft));
        }
        if let Some(dt) = patch.data_type {
            sets.push("data_type = ?");
            values.push(Value::from(dt));
        }
        if let Some(s) = &patch.sender {
            sets.push("sender = ?");
            values.push(Value::Blob(s.as_bytes().to_vec()));
        }
        if let Some(g) = patch.group_id {
            sets.push("group_id = ?");
            values.push(blob(g.as_bytes()));
        }
        if let Some(d) = patch.user_date {
            sets.push("user_date = ?");
            values.push(Value::from(d.as_i64()));
        }
        if let Some(sg) = patch.security_group {
            sets.push("security_group = ?");
            values.push(Value::from(sg));
        }
        if let Some(a) = patch.archival_status {
            sets.push("archival_status = ?");
            values.push(Value::from(a));
        }

        values.push(blob(id.as_bytes()));
        let sql = format!("UPDATE entries SET {} WHERE id = ?", sets.join(", "));
        let n = tx
            .execute(&sql, rusqlite::params_from_iter(values.iter()))
            .map_err(|e| map_constraint(e, "unique id"))?;
        if n == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// Advances the modification stamp without changing any field. Makes the
    /// entry visible to the modification feed.
    pub fn touch(&self, id: EntryId) -> StoreResult<ChangeStamp> {
        let stamp = self.next_stamp();
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE entries SET modified = ?1 WHERE id = ?2",
            params![stamp.encode(), id.as_bytes().as_slice()],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(stamp)
    }

    /// Deletes an entry. Memberships cascade when the store was opened with
    /// `cascade_delete` (the default); otherwise they are left behind.
    ///
    /// Returns whether an entry was deleted.
    pub fn delete_entry(&self, id: EntryId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        if self.cascade_delete {
            tx.execute(
                "DELETE FROM tag_index WHERE entry_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            tx.execute(
                "DELETE FROM acl_index WHERE entry_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
        }
        let n = tx.execute(
            "DELETE FROM entries WHERE id = ?1",
            params![id.as_bytes().as_slice()],
        )?;
        tx.commit()?;
        debug!(id = %id, deleted = n > 0, "deleted entry");
        Ok(n > 0)
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Fetches a single entry by id.
    pub fn get_entry(&self, id: EntryId) -> StoreResult<Option<EntryRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, unique_id, transit_id, file_type, data_type, sender, group_id,
                    user_date, security_group, archival_status, created, modified
             FROM entries WHERE id = ?1",
            params![id.as_bytes().as_slice()],
            |row| {
                Ok(RawEntryRow {
                    id: row.get(0)?,
                    unique_id: row.get(1)?,
                    transit_id: row.get(2)?,
                    file_type: row.get(3)?,
                    data_type: row.get(4)?,
                    sender: row.get(5)?,
                    group_id: row.get(6)?,
                    user_date: row.get(7)?,
                    security_group: row.get(8)?,
                    archival_status: row.get(9)?,
                    created: row.get(10)?,
                    modified: row.get(11)?,
                })
            },
        )
        .optional()?
        .map(RawEntryRow::into_record)
        .transpose()
    }

    /// Returns the tags an entry is a member of.
    pub fn entry_tags(&self, id: EntryId) -> StoreResult<Vec<TagId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT tag_id FROM tag_index WHERE entry_id = ?1 ORDER BY tag_id")?;
        let rows = stmt.query_map(params![id.as_bytes().as_slice()], |row| {
            row.get::<_, Vec<u8>>(0)
        })?;
        let mut tags = Vec::new();
        for row in rows {
            tags.push(TagId::from_bytes(fixed16(row?)?));
        }
        Ok(tags)
    }

    /// Returns the ACL members an entry is shared with.
    pub fn entry_acl(&self, id: EntryId) -> StoreResult<Vec<AclMemberId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT member_id FROM acl_index WHERE entry_id = ?1 ORDER BY member_id")?;
        let rows = stmt.query_map(params![id.as_bytes().as_slice()], |row| {
            row.get::<_, Vec<u8>>(0)
        })?;
        let mut members = Vec::new();
        for row in rows {
            members.push(AclMemberId::from_bytes(fixed16(row?)?));
        }
        Ok(members)
    }

    /// Total number of indexed entries.
    pub fn entry_count(&self) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

struct RawEntryRow {
    id: Vec<u8>,
    unique_id: Option<Vec<u8>>,
    transit_id: Option<Vec<u8>>,
    file_type: i32,
    data_type: i32,
    sender: Option<Vec<u8>>,
    group_id: Option<Vec<u8>>,
    user_date: i64,
    security_group: i32,
    archival_status: i32,
    created: i64,
    modified: Option<i64>,
}

impl RawEntryRow {
    fn into_record(self) -> StoreResult<EntryRecord> {
        Ok(EntryRecord {
            id: EntryId::from_bytes(fixed16(self.id)?),
            unique_id: self.unique_id.map(fixed16).transpose()?.map(UniqueId::from_bytes),
            transit_id: self.transit_id.map(fixed16).transpose()?.map(TransitId::from_bytes),
            file_type: self.file_type,
            data_type: self.data_type,
            sender: self.sender.map(SenderId::new),
            group_id: self.group_id.map(fixed16).transpose()?.map(GroupId::from_bytes),
            user_date: UnixMillis(self.user_date),
            security_group: self.security_group,
            archival_status: self.archival_status,
            created: UnixMillis(self.created),
            modified: self.modified.map(ChangeStamp::decode),
        })
    }
}

pub(crate) fn fixed16(bytes: Vec<u8>) -> StoreResult<[u8; 16]> {
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| StoreError::Corrupt(format!("expected 16-byte id, got {len} bytes")))
}

fn map_constraint(e: rusqlite::Error, what: &'static str) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Duplicate(what)
        }
        _ => StoreError::Database(e),
    }
}
