//! Integration tests for the book list engine

use std::sync::Arc;

use bridge_desktop::MemorySettingsStore;
use bridge_traits::time::FixedClock;
use chrono::{TimeZone, Utc};
use core_library::{
    Book, BookListView, RawBook, ReadStatus, SentinelOutcome, SortDirection, SortKey,
    StatusFilter, ViewPreferences,
};
use serde_json::json;

fn numbered_books(count: i64) -> Vec<Book> {
    (1..=count)
        .map(|id| Book::new(id, format!("Book {:02}", id), "Some Author"))
        .collect()
}

fn titles(view: &BookListView) -> Vec<String> {
    view.displayed().iter().map(|b| b.title.clone()).collect()
}

fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()))
}

#[test]
fn test_pagination_walk_over_45_records() {
    let mut view = BookListView::builder().build(numbered_books(45));
    assert_eq!(view.displayed().len(), 20);
    assert!(view.has_more());

    assert_eq!(view.load_more(), 20);
    assert_eq!(view.displayed().len(), 40);
    assert!(view.has_more());

    assert_eq!(view.load_more(), 5);
    assert_eq!(view.displayed().len(), 45);
    assert!(!view.has_more());

    assert_eq!(view.load_more(), 0);
    assert_eq!(view.displayed().len(), 45);
}

#[test]
fn test_configured_page_size() {
    let view = BookListView::builder().page_size(5).build(numbered_books(12));
    assert_eq!(view.displayed().len(), 5);
    assert!(view.has_more());
}

#[test]
fn test_derivation_resets_window() {
    let mut view = BookListView::builder().build(numbered_books(45));
    view.load_more();
    assert_eq!(view.displayed().len(), 40);

    view.set_sort_direction(SortDirection::Descending);
    assert_eq!(view.displayed().len(), 20);
    assert!(view.has_more());
    assert_eq!(view.displayed()[0].title, "Book 45");
}

#[test]
fn test_search_is_case_insensitive_substring() {
    let books = vec![
        Book::new(1, "The Grapes of Wrath", "John Steinbeck"),
        Book::new(2, "Emma", "Jane Austen"),
        Book::new(3, "GRAPES and Vines", "Anon"),
    ];
    let mut view = BookListView::builder().build(books);

    view.set_search_term("grapes");
    assert_eq!(titles(&view), vec!["The Grapes of Wrath", "GRAPES and Vines"]);

    view.set_search_term("");
    assert_eq!(view.displayed().len(), 3);

    view.set_search_term("zzz");
    assert!(view.displayed().is_empty());
    assert!(!view.has_more());
}

#[test]
fn test_status_filter_selects_exact_status() {
    let mut books = numbered_books(6);
    books[1].read_status = ReadStatus::Reading;
    books[3].read_status = ReadStatus::Read;
    books[4].read_status = ReadStatus::Read;

    let mut view = BookListView::builder().build(books);

    view.set_status_filter(StatusFilter::Read);
    assert_eq!(titles(&view), vec!["Book 04", "Book 05"]);

    view.set_status_filter(StatusFilter::Reading);
    assert_eq!(titles(&view), vec!["Book 02"]);

    view.set_status_filter(StatusFilter::NotRead);
    assert_eq!(titles(&view), vec!["Book 01", "Book 03", "Book 06"]);
}

#[test]
fn test_rating_tie_orders_by_title() {
    let mut beta = Book::new(1, "Beta", "Zed Writer");
    beta.rating = Some(3);
    let mut alpha = Book::new(2, "Alpha", "Ann Writer");
    alpha.rating = Some(3);

    let view = BookListView::builder()
        .preferences(ViewPreferences::new(
            SortKey::Rating,
            SortDirection::Ascending,
            StatusFilter::All,
        ))
        .build(vec![beta, alpha]);

    assert_eq!(titles(&view), vec!["Alpha", "Beta"]);
}

#[test]
fn test_reading_dates_with_fixed_clock() {
    let mut done = Book::new(1, "Done", "A");
    done.read_start_date = Some("2024-01-01".to_string());
    done.read_end_date = Some("2024-02-01".to_string());
    let mut current = Book::new(2, "Current", "B");
    current.read_start_date = Some("2024-06-01".to_string());
    let untouched = Book::new(3, "Untouched", "C");

    let mut view = BookListView::builder()
        .clock(fixed_clock())
        .build(vec![untouched, current, done]);

    view.set_sort_key(SortKey::ReadEndDate);
    assert_eq!(titles(&view), vec!["Done", "Current", "Untouched"]);

    view.toggle_sort_direction();
    assert_eq!(titles(&view), vec!["Current", "Done", "Untouched"]);
}

#[test]
fn test_sentinel_admits_one_load_per_intersection() {
    let mut view = BookListView::builder().build(numbered_books(45));
    let ticket = view.sentinel_ticket();

    assert_eq!(view.handle_sentinel(ticket), SentinelOutcome::Loaded(20));
    assert_eq!(view.handle_sentinel(ticket), SentinelOutcome::Loaded(5));
    assert_eq!(view.handle_sentinel(ticket), SentinelOutcome::Exhausted);
    assert_eq!(view.handle_sentinel(ticket), SentinelOutcome::Duplicate);
}

#[test]
fn test_sentinel_ticket_goes_stale_after_derivation() {
    let mut view = BookListView::builder().build(numbered_books(45));
    let ticket = view.sentinel_ticket();

    view.set_search_term("Book");
    assert_eq!(view.handle_sentinel(ticket), SentinelOutcome::Stale);
    assert_eq!(view.displayed().len(), 20);

    let fresh = view.sentinel_ticket();
    assert_eq!(view.handle_sentinel(fresh), SentinelOutcome::Loaded(20));
}

#[test]
fn test_duplicate_trigger_without_growth_is_ignored() {
    let mut view = BookListView::builder().build(numbered_books(45));
    let ticket = view.sentinel_ticket();

    assert_eq!(view.handle_sentinel(ticket), SentinelOutcome::Loaded(20));
    view.load_more();
    // window grew through a direct load, so the next trigger is admitted
    assert_eq!(view.handle_sentinel(ticket), SentinelOutcome::Exhausted);
    assert_eq!(view.handle_sentinel(ticket), SentinelOutcome::Duplicate);
}

#[test]
fn test_rederiving_twice_is_idempotent() {
    let mut books = numbered_books(30);
    for (i, book) in books.iter_mut().enumerate() {
        book.rating = Some((i % 5) as i32 + 1);
        book.author = format!("Writer {}", (i * 7) % 11);
    }

    let mut view = BookListView::builder().build(books);
    view.set_sort_key(SortKey::Rating);
    let first: Vec<i64> = view.filtered_sorted().iter().map(|b| b.id.0).collect();

    let reordered: Vec<Book> = view.filtered_sorted().into_iter().cloned().collect();
    view.set_books(reordered);
    let second: Vec<i64> = view.filtered_sorted().iter().map(|b| b.id.0).collect();

    assert_eq!(first, second);
}

#[test]
fn test_equal_keys_keep_collection_order() {
    let books: Vec<Book> = [5, 3, 9, 1]
        .into_iter()
        .map(|id| Book::new(id, "Same Title", "Same Author"))
        .collect();

    let view = BookListView::builder()
        .preferences(ViewPreferences::new(
            SortKey::Title,
            SortDirection::Descending,
            StatusFilter::All,
        ))
        .build(books);

    let ids: Vec<i64> = view.displayed().iter().map(|b| b.id.0).collect();
    assert_eq!(ids, vec![5, 3, 9, 1]);
}

#[test]
fn test_raw_records_with_missing_fields() {
    let records: Vec<RawBook> = [
        json!({"id": 1, "title": "Gamma", "year": 1990, "read_status": "read"}),
        json!({"id": 2, "title": "No Year", "read_status": "read"}),
        json!({"id": 3, "title": "Alpha", "year": 1950, "read_status": "read"}),
        json!({"id": 4, "title": "Unknown Status", "year": 1900}),
    ]
    .into_iter()
    .filter_map(|value| match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    })
    .collect();

    let mut view = BookListView::builder()
        .preferences(ViewPreferences::new(
            SortKey::Year,
            SortDirection::Ascending,
            StatusFilter::All,
        ))
        .build(records);

    let ids: Vec<i64> = view
        .displayed()
        .iter()
        .filter_map(|record| record.get("id").and_then(|id| id.as_i64()))
        .collect();
    assert_eq!(ids, vec![4, 2, 3, 1]);

    view.set_status_filter(StatusFilter::Read);
    assert_eq!(view.displayed().len(), 3);
}

#[tokio::test]
async fn test_preferences_round_trip_through_store() {
    let store = MemorySettingsStore::new();
    let prefs = ViewPreferences::new(
        SortKey::Author,
        SortDirection::Descending,
        StatusFilter::Reading,
    );
    prefs.save(&store).await.unwrap();

    let loaded = ViewPreferences::load(&store).await.unwrap();
    assert_eq!(loaded, prefs);

    let view = BookListView::builder().preferences(loaded).build(numbered_books(3));
    assert_eq!(view.preferences(), prefs);
    assert!(view.displayed().is_empty());
}
