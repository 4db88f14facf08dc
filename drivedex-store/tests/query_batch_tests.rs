//! Single-scan batch queries: directions, orderings, start points and
//! stop boundaries.

mod common;

use common::{add, add_entry, all_scoped, mint_ids, open_seq_store, open_store};
use drivedex_store::{BatchCursor, Direction, SortField};
use drivedex_types::{EntryId, UnixMillis};
use std::thread::sleep;
use std::time::Duration;

// ── Paging and has_more ──────────────────────────────────────────

#[test]
fn newest_first_pages_with_has_more() {
    let store = open_store();
    let filters = all_scoped();
    let ids = mint_ids(3);
    for id in &ids {
        add(&store, *id, 1);
    }

    let page = store
        .query_batch(2, BatchCursor::new(), Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[2], ids[1]]);
    assert!(page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[1]));

    let page = store
        .query_batch(1, page.cursor, Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[0]]);
    assert!(!page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[0]));

    let page = store
        .query_batch(1, page.cursor, Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert!(page.ids.is_empty());
    assert!(!page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[0]));
}

#[test]
fn oldest_first_pages_with_has_more() {
    let store = open_store();
    let filters = all_scoped();
    let ids = mint_ids(3);
    for id in &ids {
        add(&store, *id, 1);
    }

    let page = store
        .query_batch(2, BatchCursor::new(), Direction::OldestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[0], ids[1]]);
    assert!(page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[1]));

    let page = store
        .query_batch(1, page.cursor, Direction::OldestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[2]]);
    assert!(!page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[2]));

    let page = store
        .query_batch(1, page.cursor, Direction::OldestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert!(page.ids.is_empty());
    assert!(!page.has_more);
}

#[test]
fn each_direction_starts_at_its_own_end() {
    let store = open_store();
    let filters = all_scoped();
    let ids = mint_ids(3);
    for id in &ids {
        add(&store, *id, 1);
    }

    let newest = store
        .query_batch(1, BatchCursor::new(), Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(newest.ids, vec![ids[2]]);

    let oldest = store
        .query_batch(1, BatchCursor::new(), Direction::OldestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(oldest.ids, vec![ids[0]]);
}

// ── User-date ordering ───────────────────────────────────────────

#[test]
fn user_date_newest_first() {
    let store = open_store();
    let filters = all_scoped();
    let ids = mint_ids(3);
    add_entry(&store, ids[0], 1, UnixMillis(1000), &[], &[]);
    add_entry(&store, ids[1], 1, UnixMillis(42), &[], &[]);
    add_entry(&store, ids[2], 1, UnixMillis(2000), &[], &[]);

    let page = store
        .query_batch(2, BatchCursor::new(), Direction::NewestFirst, SortField::UserDate, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[2], ids[0]]);
    assert!(page.has_more);

    let page = store
        .query_batch(1, page.cursor, Direction::NewestFirst, SortField::UserDate, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[1]]);
    assert!(!page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[1]));
    assert_eq!(page.cursor.user_date_paging, Some(UnixMillis(42)));

    let page = store
        .query_batch(1, page.cursor, Direction::NewestFirst, SortField::UserDate, &filters)
        .unwrap();
    assert!(page.ids.is_empty());
    assert!(!page.has_more);
}

#[test]
fn user_date_oldest_first() {
    let store = open_store();
    let filters = all_scoped();
    let ids = mint_ids(3);
    add_entry(&store, ids[0], 1, UnixMillis(1000), &[], &[]);
    add_entry(&store, ids[1], 1, UnixMillis(42), &[], &[]);
    add_entry(&store, ids[2], 1, UnixMillis(2000), &[], &[]);

    let page = store
        .query_batch(2, BatchCursor::new(), Direction::OldestFirst, SortField::UserDate, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[1], ids[0]]);
    assert!(page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[0]));

    let page = store
        .query_batch(1, page.cursor, Direction::OldestFirst, SortField::UserDate, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[2]]);
    assert!(!page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[2]));
}

#[test]
fn user_date_ties_break_by_id() {
    let store = open_store();
    let filters = all_scoped();
    let ids = mint_ids(3);
    for id in &ids {
        add_entry(&store, *id, 1, UnixMillis(500), &[], &[]);
    }

    let page = store
        .query_batch(10, BatchCursor::new(), Direction::NewestFirst, SortField::UserDate, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[2], ids[1], ids[0]]);
}

// ── Start points ─────────────────────────────────────────────────

#[test]
fn start_point_by_id_bounds_nothing() {
    let store = open_store();
    let filters = all_scoped();
    // Mint six in order but only insert five; the missing one is a start
    // point that was never stored.
    let ids = mint_ids(6);
    let absent = ids[2];
    for id in [ids[0], ids[1], ids[3], ids[4], ids[5]] {
        add(&store, id, 1);
    }

    let page = store
        .query_batch(10, BatchCursor::start_at(absent), Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[1], ids[0]]);
    assert!(!page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[0]));

    let page = store
        .query_batch(10, BatchCursor::start_at(absent), Direction::OldestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[3], ids[4], ids[5]]);
    assert!(!page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[5]));
}

#[test]
fn start_point_by_time() {
    let store = open_store();
    let filters = all_scoped();
    let older = mint_ids(2);
    sleep(Duration::from_millis(3));
    let at = UnixMillis::now();
    sleep(Duration::from_millis(3));
    let newer = mint_ids(3);
    for id in older.iter().chain(&newer) {
        add(&store, *id, 1);
    }

    let page = store
        .query_batch(10, BatchCursor::start_at_time(at, false), Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![older[1], older[0]]);
    assert!(!page.has_more);

    let page = store
        .query_batch(10, BatchCursor::start_at_time(at, false), Direction::OldestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![newer[0], newer[1], newer[2]]);
    assert!(!page.has_more);
}

#[test]
fn start_point_by_user_date() {
    let store = open_store();
    let filters = all_scoped();
    let ids = mint_ids(5);
    add_entry(&store, ids[0], 1, UnixMillis(2000), &[], &[]);
    add_entry(&store, ids[1], 1, UnixMillis(5000), &[], &[]);
    add_entry(&store, ids[2], 1, UnixMillis(4000), &[], &[]);
    add_entry(&store, ids[3], 1, UnixMillis(3000), &[], &[]);
    add_entry(&store, ids[4], 1, UnixMillis(1000), &[], &[]);

    // Newest-first from 4000: strictly earlier dates, descending.
    let cursor = BatchCursor::start_at_time(UnixMillis(4000), true);
    let page = store
        .query_batch(10, cursor, Direction::NewestFirst, SortField::UserDate, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[3], ids[0], ids[4]]);
    assert!(!page.has_more);

    // Oldest-first from the same point: dates at or after 4000, ascending.
    let cursor = BatchCursor::start_at_time(UnixMillis(4000), true);
    let page = store
        .query_batch(10, cursor, Direction::OldestFirst, SortField::UserDate, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[2], ids[1]]);
    assert!(!page.has_more);
}

// ── Stop boundaries ──────────────────────────────────────────────

#[test]
fn stop_boundary_by_id() {
    let store = open_store();
    let filters = all_scoped();
    let ids = mint_ids(6);
    let boundary = ids[2];
    for id in [ids[0], ids[1], ids[3], ids[4], ids[5]] {
        add(&store, id, 1);
    }

    // Newest-first stops when the scan reaches the boundary.
    let page = store
        .query_batch(10, BatchCursor::stop_at_boundary(boundary), Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[5], ids[4], ids[3]]);
    assert!(!page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[3]));

    let page = store
        .query_batch(10, page.cursor, Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert!(page.ids.is_empty());
    assert!(!page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[3]));

    // Oldest-first with the same boundary covers the other side.
    let page = store
        .query_batch(10, BatchCursor::stop_at_boundary(boundary), Direction::OldestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[0], ids[1]]);
    assert!(!page.has_more);
    assert_eq!(page.cursor.paging, Some(ids[1]));
}

#[test]
fn stop_boundary_by_time() {
    let store = open_store();
    let filters = all_scoped();
    let older = mint_ids(2);
    sleep(Duration::from_millis(3));
    let at = UnixMillis::now();
    sleep(Duration::from_millis(3));
    let newer = mint_ids(3);
    for id in older.iter().chain(&newer) {
        add(&store, *id, 1);
    }

    let page = store
        .query_batch(10, BatchCursor::stop_at_time(at, false), Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![newer[2], newer[1], newer[0]]);
    assert!(!page.has_more);

    let page = store
        .query_batch(10, BatchCursor::stop_at_time(at, false), Direction::OldestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![older[0], older[1]]);
    assert!(!page.has_more);
}

// ── Insertion-sequence ordering ──────────────────────────────────

#[test]
fn insertion_order_ignores_id_order() {
    let store = open_seq_store();
    let filters = all_scoped();
    // Insert in the opposite of id order: the sequence, not the id, must
    // drive the scan.
    let ids = mint_ids(3);
    add(&store, ids[2], 1);
    add(&store, ids[1], 1);
    add(&store, ids[0], 1);

    let page = store
        .query_batch(10, BatchCursor::new(), Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[0], ids[1], ids[2]]);

    let page = store
        .query_batch(10, BatchCursor::new(), Direction::OldestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[2], ids[1], ids[0]]);
}

#[test]
fn insertion_order_paging_resumes_by_sequence() {
    let store = open_seq_store();
    let filters = all_scoped();
    let ids = mint_ids(4);
    add(&store, ids[3], 1);
    add(&store, ids[0], 1);
    add(&store, ids[2], 1);
    add(&store, ids[1], 1);

    let page = store
        .query_batch(2, BatchCursor::new(), Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[1], ids[2]]);
    assert!(page.has_more);

    let page = store
        .query_batch(2, page.cursor, Direction::NewestFirst, SortField::Identifier, &filters)
        .unwrap();
    assert_eq!(page.ids, vec![ids[0], ids[3]]);
    assert!(!page.has_more);
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn zero_page_size_is_an_error() {
    let store = open_store();
    let res = store.query_batch(
        0,
        BatchCursor::new(),
        Direction::NewestFirst,
        SortField::Identifier,
        &all_scoped(),
    );
    assert!(res.is_err());
}

#[test]
fn user_date_ordering_rejects_cursor_without_date() {
    let store = open_store();
    add(&store, EntryId::new(), 1);
    // A paging position without its paired user date cannot drive the
    // user-date composite ordering.
    let cursor = BatchCursor::start_at(EntryId::new());
    let res = store.query_batch(
        10,
        cursor,
        Direction::NewestFirst,
        SortField::UserDate,
        &all_scoped(),
    );
    assert!(res.is_err());
}
