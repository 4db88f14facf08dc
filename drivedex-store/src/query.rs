//! The cursor query engine: batch, auto batch, and modified queries.
//!
//! Every query is one bounded, parameterized scan of the entry table. The
//! auto query chains scans when the session's snapshot boundary has fallen
//! behind the live edge of the store, so a caller paging with a stable page
//! size always receives a gap-free, non-overlapping walk.

use crate::cursor::BatchCursor;
use crate::error::{StoreError, StoreResult};
use crate::filter::{blob, QueryFilters, WhereBuilder};
use crate::store::{fixed16, DriveStore};
use drivedex_types::{ChangeStamp, EntryId, UnixMillis};
use rusqlite::types::Value;
use tracing::trace;

/// Scan direction for a batch query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Newest sort key first.
    NewestFirst,
    /// Oldest sort key first.
    OldestFirst,
}

/// Which field drives the ordering within a batch query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// The store's primary sort key (entry id or insertion sequence,
    /// per the store's ordering mode).
    Identifier,
    /// The `(user_date, entry id)` composite, id breaking ties.
    UserDate,
}

/// One page of batch-query results plus the updated cursor.
#[derive(Debug, Clone)]
pub struct BatchPage {
    /// Matching entry ids, in the requested order.
    pub ids: Vec<EntryId>,
    /// Whether more matching rows exist beyond this page.
    pub has_more: bool,
    /// Cursor to pass to the next call.
    pub cursor: BatchCursor,
}

/// One page of modification-feed results plus the advanced cursor.
#[derive(Debug, Clone)]
pub struct ModifiedPage {
    /// Entry ids in ascending modification order.
    pub ids: Vec<EntryId>,
    /// Whether more modified rows exist beyond this page.
    pub has_more: bool,
    /// Stamp of the last row returned; unchanged when the page is empty.
    pub cursor: ChangeStamp,
}

impl DriveStore {
    /// Runs one bounded scan and returns up to `page_size` entry ids.
    ///
    /// The cursor's paging position is the exclusive continuation point and
    /// its stop boundary (if any) the far edge of the scan, both oriented
    /// per `direction`. The returned cursor has the paging position advanced
    /// to the last row returned; an empty page leaves the cursor untouched,
    /// so an exhausted cursor keeps returning empty pages without state
    /// changes.
    pub fn query_batch(
        &self,
        page_size: usize,
        cursor: BatchCursor,
        direction: Direction,
        sort: SortField,
        filters: &QueryFilters,
    ) -> StoreResult<BatchPage> {
        if page_size == 0 {
            return Err(StoreError::InvalidPageSize);
        }

        let (sign, isign, dir) = match direction {
            Direction::NewestFirst => ("<", ">", "DESC"),
            Direction::OldestFirst => (">", "<", "ASC"),
        };

        let mut cursor = cursor;
        let mut wb = WhereBuilder::new();

        match sort {
            SortField::Identifier => {
                let key = self.ordering.sort_expr();
                let lookup = self.ordering.key_expr();
                if let Some(p) = cursor.paging {
                    wb.push(format!("{key} {sign} {lookup}"), [blob(p.as_bytes())]);
                }
                if let Some(s) = cursor.stop_at {
                    wb.push(format!("{key} {isign} {lookup}"), [blob(s.as_bytes())]);
                }
            }
            SortField::UserDate => {
                if let Some(p) = cursor.paging {
                    let d = cursor.user_date_paging.ok_or(StoreError::InvalidCursor(
                        "user-date ordering needs a user-date paging value",
                    ))?;
                    wb.push(
                        format!("((e.user_date = ? AND e.id {sign} ?) OR e.user_date {sign} ?)"),
                        [Value::from(d.as_i64()), blob(p.as_bytes()), Value::from(d.as_i64())],
                    );
                }
                if let Some(s) = cursor.stop_at {
                    let d = cursor.user_date_stop.ok_or(StoreError::InvalidCursor(
                        "user-date ordering needs a user-date stop value",
                    ))?;
                    wb.push(
                        format!("((e.user_date = ? AND e.id {isign} ?) OR e.user_date {isign} ?)"),
                        [Value::from(d.as_i64()), blob(s.as_bytes()), Value::from(d.as_i64())],
                    );
                }
            }
        }

        filters.apply(&mut wb);

        let (select, order) = match sort {
            SortField::Identifier => ("e.id", format!("{} {dir}", self.ordering.sort_expr())),
            SortField::UserDate => ("e.id, e.user_date", format!("e.user_date {dir}, e.id {dir}")),
        };

        // One extra row tells us whether more data exists past this page.
        let sql = format!(
            "SELECT {select} FROM entries e{} ORDER BY {order} LIMIT {}",
            wb.where_sql(),
            page_size + 1
        );
        trace!(sql = %sql, "query_batch");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(wb.params().iter()))?;

        let mut ids: Vec<EntryId> = Vec::new();
        let mut last_user_date: Option<i64> = None;
        let mut has_more = false;
        while let Some(row) = rows.next()? {
            if ids.len() == page_size {
                has_more = true;
                break;
            }
            let id: Vec<u8> = row.get(0)?;
            ids.push(EntryId::from_bytes(fixed16(id)?));
            if matches!(sort, SortField::UserDate) {
                last_user_date = Some(row.get(1)?);
            }
        }

        if let Some(&last) = ids.last() {
            cursor.paging = Some(last);
            if let Some(d) = last_user_date {
                cursor.user_date_paging = Some(UnixMillis(d));
            }
        }

        Ok(BatchPage { ids, has_more, cursor })
    }

    /// Like [`DriveStore::query_batch`], newest-first, but guarantees the
    /// page fills to `page_size` whenever that many matching rows exist —
    /// even when they straddle the session's snapshot boundary because rows
    /// were inserted between calls.
    ///
    /// Repeated calls with the returned cursor walk the store contiguously,
    /// without overlaps, and report `has_more = false` only when truly
    /// caught up to the live edge.
    pub fn query_batch_auto(
        &self,
        page_size: usize,
        cursor: BatchCursor,
        filters: &QueryFilters,
    ) -> StoreResult<BatchPage> {
        if page_size == 0 {
            return Err(StoreError::InvalidPageSize);
        }
        let paging_was_empty = cursor.paging.is_none();

        let page =
            self.query_batch(page_size, cursor, Direction::NewestFirst, SortField::Identifier, filters)?;
        let BatchPage { ids: result, has_more, mut cursor } = page;

        if !result.is_empty() {
            // First page after a (re)start from the live edge: remember the
            // newest row. It becomes the stop boundary once this window
            // drains, pinning where the next catch-up scan ends.
            if paging_was_empty {
                cursor.next_boundary = result.first().copied();
            }

            if result.len() < page_size {
                if !has_more {
                    advance_boundary(&mut cursor);
                }

                // A short page means end-of-data to the caller, so prove the
                // remainder really is empty — pulling in rows newer than the
                // old boundary if any arrived since the session started.
                let rest = self.query_batch_auto(page_size - result.len(), cursor, filters)?;
                if !rest.ids.is_empty() {
                    let mut ids = rest.ids;
                    ids.extend(result);
                    return Ok(BatchPage { ids, has_more: rest.has_more, cursor: rest.cursor });
                }
                cursor = rest.cursor;
            }
            Ok(BatchPage { ids: result, has_more, cursor })
        } else if cursor.next_boundary.is_some() {
            advance_boundary(&mut cursor);
            self.query_batch_auto(page_size, cursor, filters)
        } else {
            cursor.paging = None;
            Ok(BatchPage { ids: result, has_more, cursor })
        }
    }

    /// Pages the modification feed: entries whose modification stamp
    /// strictly exceeds the cursor, oldest modification first.
    ///
    /// Entries inserted but never updated carry no stamp and are never
    /// returned, whatever the cursor. The same filter predicate applies as
    /// in batch queries. `stop_at`, when given, bounds the feed to stamps at
    /// or after it.
    pub fn query_modified(
        &self,
        page_size: usize,
        cursor: ChangeStamp,
        stop_at: Option<ChangeStamp>,
        filters: &QueryFilters,
    ) -> StoreResult<ModifiedPage> {
        if page_size == 0 {
            return Err(StoreError::InvalidPageSize);
        }

        let mut wb = WhereBuilder::new();
        wb.push("e.modified > ?", [Value::from(cursor.encode())]);
        if let Some(stop) = stop_at {
            wb.push("e.modified >= ?", [Value::from(stop.encode())]);
        }
        filters.apply(&mut wb);

        let sql = format!(
            "SELECT e.id, e.modified FROM entries e{} ORDER BY e.modified ASC LIMIT {}",
            wb.where_sql(),
            page_size + 1
        );
        trace!(sql = %sql, "query_modified");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(wb.params().iter()))?;

        let mut ids: Vec<EntryId> = Vec::new();
        let mut last_stamp: Option<i64> = None;
        let mut has_more = false;
        while let Some(row) = rows.next()? {
            if ids.len() == page_size {
                has_more = true;
                break;
            }
            let id: Vec<u8> = row.get(0)?;
            ids.push(EntryId::from_bytes(fixed16(id)?));
            last_stamp = Some(row.get(1)?);
        }

        let cursor = last_stamp.map_or(cursor, ChangeStamp::decode);
        Ok(ModifiedPage { ids, has_more, cursor })
    }
}

/// Promotes the pending boundary to the active stop boundary and rewinds the
/// paging position to the live edge.
fn advance_boundary(cursor: &mut BatchCursor) {
    if let Some(next) = cursor.next_boundary.take() {
        cursor.stop_at = Some(next);
    }
    cursor.paging = None;
}
