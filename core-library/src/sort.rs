//! Sort keys and the book comparator.
//!
//! Every sort dimension maps a raw field to a sortable value. Numeric
//! fields pass through; `title`, `author` and `read_end_date` go through a
//! named transform first:
//!
//! - **title**: lower-cased, a leading "the", "a" or "an" dropped
//! - **author**: lower-cased surname, honouring particles such as "Le" or "de"
//! - **read_end_date**: parsed date; a book still being read counts as
//!   finishing "now"
//!
//! Unset values always end up at the tail of the list, whichever direction
//! is active. Ties on the primary key fall back to the title (or to the
//! author when sorting by title).

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bridge_traits::time::Clock;

use crate::error::LibraryError;
use crate::record::{FieldValue, LibraryRecord};

const LEADING_ARTICLES: &[&str] = &["the", "a", "an"];

/// Particles that belong to the surname ("Le Guin")
const INTEGRAL_PREFIXES: &[&str] = &["le", "la", "de la"];

/// Particles skipped when sorting ("de Maupassant" sorts under M)
const IGNORABLE_PREFIXES: &[&str] = &[
    "van", "von", "de", "del", "di", "da", "al", "bin", "mc", "mac", "ibn",
];

// =============================================================================
// Keys and directions
// =============================================================================

/// Field a book list is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Insertion order ("date added")
    #[default]
    Id,
    Title,
    Author,
    Year,
    Rating,
    ReadEndDate,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Id,
        SortKey::Title,
        SortKey::Author,
        SortKey::Year,
        SortKey::Rating,
        SortKey::ReadEndDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Title => "title",
            SortKey::Author => "author",
            SortKey::Year => "year",
            SortKey::Rating => "rating",
            SortKey::ReadEndDate => "read_end_date",
        }
    }

    /// Key used to break ties on this one
    pub fn secondary(&self) -> SortKey {
        match self {
            SortKey::Title => SortKey::Author,
            _ => SortKey::Title,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| LibraryError::InvalidInput {
                field: "sort_key".to_string(),
                message: format!("Unknown sort key '{}'", s),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending" => Ok(SortDirection::Ascending),
            "descending" => Ok(SortDirection::Descending),
            other => Err(LibraryError::InvalidInput {
                field: "sort_direction".to_string(),
                message: format!("Unknown sort direction '{}'", other),
            }),
        }
    }
}

/// Which mapped values count as "unset" for null placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NullPolicy {
    /// Only null is unset; `0` and `""` sort as ordinary values
    #[default]
    Strict,
    /// `0` and `""` are also unset, matching the web client's historical
    /// truthiness check
    Falsy,
}

// =============================================================================
// Sortable values
// =============================================================================

/// A field value after its transform. Variants of different kinds order by
/// kind (integers, then dates, then text).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Integer(i64),
    Date(DateTime<Utc>),
    Text(String),
}

impl SortValue {
    fn is_falsy(&self) -> bool {
        match self {
            SortValue::Integer(n) => *n == 0,
            SortValue::Text(s) => s.is_empty(),
            SortValue::Date(_) => false,
        }
    }
}

/// Inputs fixed for the duration of one sort
#[derive(Debug, Clone, Copy)]
pub struct SortContext {
    now: DateTime<Utc>,
    null_policy: NullPolicy,
}

impl SortContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            null_policy: NullPolicy::default(),
        }
    }

    /// Capture "now" once from a clock
    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self::new(clock.now())
    }

    pub fn with_null_policy(mut self, null_policy: NullPolicy) -> Self {
        self.null_policy = null_policy;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn null_policy(&self) -> NullPolicy {
        self.null_policy
    }
}

/// Title with a leading English article removed, lower-cased
///
/// ```
/// use core_library::sort::title_key;
///
/// assert_eq!(title_key("The Hobbit"), title_key("Hobbit"));
/// assert_eq!(title_key("An Unquiet Mind"), "unquiet mind");
/// assert_eq!(title_key("Theory of Everything"), "theory of everything");
/// ```
pub fn title_key(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = match lowered.split_once(' ') {
        Some((first, rest)) if LEADING_ARTICLES.contains(&first) => Some(rest.to_string()),
        None if LEADING_ARTICLES.contains(&lowered.as_str()) => Some(String::new()),
        _ => None,
    };
    stripped.unwrap_or(lowered)
}

/// Lower-cased surname of an author name
///
/// Scans from the end of the name for the first particle. An integral
/// particle stays part of the surname; an ignorable one is dropped and the
/// word after it is used.
///
/// ```
/// use core_library::sort::author_key;
///
/// assert_eq!(author_key("Ursula K. Le Guin"), "le guin");
/// assert_eq!(author_key("Guy de Maupassant"), "maupassant");
/// assert_eq!(author_key("John Steinbeck"), "steinbeck");
/// ```
pub fn author_key(name: &str) -> String {
    let parts: Vec<&str> = name.split(' ').collect();
    let mut surname = parts.last().copied().unwrap_or_default().to_string();

    for i in (1..parts.len()).rev() {
        let prefix = parts[i - 1].to_lowercase();
        if INTEGRAL_PREFIXES.contains(&prefix.as_str()) {
            surname = parts[i - 1..].join(" ");
            break;
        }
        if IGNORABLE_PREFIXES.contains(&prefix.as_str()) {
            surname = parts[i].to_string();
            break;
        }
    }

    surname.to_lowercase()
}

/// Parse an ISO-8601 date or date-time; `None` when malformed
///
/// Bare dates are taken as midnight UTC.
pub fn parse_record_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Sortable end date of a reading
///
/// A missing end date with a start date means the book is in progress and
/// sorts as `now`. A malformed end date is unset.
pub fn reading_end_key<R: LibraryRecord + ?Sized>(
    read_end_date: FieldValue<'_>,
    record: &R,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match read_end_date {
        FieldValue::Text(raw) if !raw.trim().is_empty() => parse_record_date(raw),
        FieldValue::Integer(millis) => Utc.timestamp_millis_opt(millis).single(),
        _ => record
            .read_start_date()
            .filter(|start| !start.trim().is_empty())
            .map(|_| now),
    }
}

/// Map a record's field to its sortable value. `None` means unset.
pub fn sortable_value<R: LibraryRecord + ?Sized>(
    key: SortKey,
    record: &R,
    ctx: &SortContext,
) -> Option<SortValue> {
    map_field(key, record.field(key), record, ctx)
}

fn map_field<R: LibraryRecord + ?Sized>(
    key: SortKey,
    value: FieldValue<'_>,
    record: &R,
    ctx: &SortContext,
) -> Option<SortValue> {
    let mapped = if key == SortKey::ReadEndDate {
        reading_end_key(value, record, ctx.now).map(SortValue::Date)
    } else {
        match value {
            FieldValue::Absent | FieldValue::Null => None,
            FieldValue::Integer(n) => Some(SortValue::Integer(n)),
            FieldValue::Text(text) => Some(SortValue::Text(match key {
                SortKey::Title => title_key(text),
                SortKey::Author => author_key(text),
                _ => text.to_string(),
            })),
        }
    };

    match ctx.null_policy {
        NullPolicy::Strict => mapped,
        NullPolicy::Falsy => mapped.filter(|value| !value.is_falsy()),
    }
}

// =============================================================================
// Comparison
// =============================================================================

/// A mapped value with unset values pinned to one end
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Positioned {
    Lowest,
    Value(SortValue),
    Highest,
}

/// Unset sits above everything when ascending and below everything when
/// descending, so after the direction is applied it is always last.
fn position(value: Option<SortValue>, direction: SortDirection) -> Positioned {
    match (value, direction) {
        (Some(value), _) => Positioned::Value(value),
        (None, SortDirection::Ascending) => Positioned::Highest,
        (None, SortDirection::Descending) => Positioned::Lowest,
    }
}

/// `None` when the record lacks the field altogether
fn positioned<R: LibraryRecord + ?Sized>(
    record: &R,
    key: SortKey,
    direction: SortDirection,
    ctx: &SortContext,
) -> Option<Positioned> {
    match record.field(key) {
        FieldValue::Absent => None,
        value => Some(position(map_field(key, value, record, ctx), direction)),
    }
}

/// Compare two records on `key`, breaking ties on the secondary key
///
/// Returns `Equal` when either record lacks `key` entirely. For records
/// that carry both keys (every typed [`Book`](crate::models::Book)) this is a
/// total order and can be handed to `sort_by`; lists that may contain
/// incomplete raw records should go through [`sorted_order`].
pub fn compare<R: LibraryRecord + ?Sized>(
    a: &R,
    b: &R,
    key: SortKey,
    direction: SortDirection,
    ctx: &SortContext,
) -> Ordering {
    let (Some(pa), Some(pb)) = (
        positioned(a, key, direction, ctx),
        positioned(b, key, direction, ctx),
    ) else {
        return Ordering::Equal;
    };

    match direction.apply(pa.cmp(&pb)) {
        Ordering::Equal => {
            let secondary = key.secondary();
            match (
                positioned(a, secondary, direction, ctx),
                positioned(b, secondary, direction, ctx),
            ) {
                (Some(sa), Some(sb)) => direction.apply(sa.cmp(&sb)),
                _ => Ordering::Equal,
            }
        }
        decided => decided,
    }
}

/// Stable order of `records` under [`compare`], as indices into `records`
///
/// Keys are mapped once per record. A record lacking the sort key keeps its
/// slot while the others are ordered around it; the same holds for the
/// secondary key within a run of primary ties.
pub fn sorted_order<R: LibraryRecord + ?Sized>(
    records: &[&R],
    key: SortKey,
    direction: SortDirection,
    ctx: &SortContext,
) -> Vec<usize> {
    let primary: Vec<Option<Positioned>> = records
        .iter()
        .map(|record| positioned(*record, key, direction, ctx))
        .collect();
    let secondary: Vec<Option<Positioned>> = records
        .iter()
        .map(|record| positioned(*record, key.secondary(), direction, ctx))
        .collect();

    let mut order: Vec<usize> = (0..records.len()).collect();
    slot_sort(&mut order, &primary, Some(&secondary), direction);
    order
}

/// Consume `records` and return them in sorted order
pub fn sort_records<R: LibraryRecord>(
    records: Vec<R>,
    key: SortKey,
    direction: SortDirection,
    ctx: &SortContext,
) -> Vec<R> {
    let order = {
        let refs: Vec<&R> = records.iter().collect();
        sorted_order(&refs, key, direction, ctx)
    };
    let mut slots: Vec<Option<R>> = records.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}

/// Stable-sort the entries of `items` that have a key, leaving keyless
/// entries where they are
fn slot_sort(
    items: &mut [usize],
    keys: &[Option<Positioned>],
    tie_break: Option<&[Option<Positioned>]>,
    direction: SortDirection,
) {
    let slots: Vec<usize> = (0..items.len())
        .filter(|&slot| keys[items[slot]].is_some())
        .collect();
    let mut present: Vec<usize> = slots.iter().map(|&slot| items[slot]).collect();
    present.sort_by(|&a, &b| direction.apply(keys[a].cmp(&keys[b])));

    if let Some(tie_keys) = tie_break {
        let mut start = 0;
        while start < present.len() {
            let run_key = &keys[present[start]];
            let run = present[start..]
                .iter()
                .take_while(|&&index| &keys[index] == run_key)
                .count();
            if run > 1 {
                slot_sort(&mut present[start..start + run], tie_keys, None, direction);
            }
            start += run;
        }
    }

    for (slot, item) in slots.into_iter().zip(present) {
        items[slot] = item;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Book;
    use crate::record::RawBook;
    use chrono::Duration;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn ctx() -> SortContext {
        SortContext::new(now())
    }

    fn book(id: i64, title: &str, author: &str) -> Book {
        Book::new(id, title, author)
    }

    fn rated(id: i64, title: &str, rating: Option<i32>) -> Book {
        let mut book = book(id, title, "Some Author");
        book.rating = rating;
        book
    }

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    fn raw(value: serde_json::Value) -> RawBook {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_title_key_strips_leading_article() {
        assert_eq!(title_key("The Hobbit"), "hobbit");
        assert_eq!(title_key("the hobbit"), title_key("Hobbit"));
        assert_eq!(title_key("A Tale of Two Cities"), "tale of two cities");
        assert_eq!(title_key("Crime and Punishment"), "crime and punishment");
        assert_eq!(title_key("Anathem"), "anathem");
        assert_eq!(title_key("The"), "");
    }

    #[test]
    fn test_author_key_particles() {
        assert_eq!(author_key("Ursula K. Le Guin"), "le guin");
        assert_eq!(author_key("Guy de Maupassant"), "maupassant");
        assert_eq!(author_key("John Steinbeck"), "steinbeck");
        assert_eq!(author_key("Ludwig van Beethoven"), "beethoven");
        assert_eq!(author_key("Homer"), "homer");
        assert_eq!(author_key(""), "");
    }

    #[test]
    fn test_author_key_keeps_documented_prefix_set() {
        // "der" is not a known particle, so the scan finds "von" one word
        // further left and keeps the word after it
        assert_eq!(author_key("Ursula von der Leyen"), "der");
        // "la" directly before the surname is integral
        assert_eq!(author_key("Juana Inés de la Cruz"), "la cruz");
    }

    #[test]
    fn test_parse_record_date_formats() {
        let midnight = Utc.with_ymd_and_hms(2023, 11, 2, 0, 0, 0).unwrap();
        assert_eq!(parse_record_date("2023-11-02"), Some(midnight));
        assert_eq!(parse_record_date("2023-11-02T00:00:00Z"), Some(midnight));
        assert_eq!(parse_record_date("2023-11-02T00:00:00"), Some(midnight));
        assert_eq!(
            parse_record_date("2023-11-02T03:00:00+03:00"),
            Some(midnight)
        );
        assert_eq!(parse_record_date("last tuesday"), None);
    }

    #[test]
    fn test_reading_end_key_in_progress_is_now() {
        let mut reading = book(1, "Middlemarch", "George Eliot");
        reading.read_start_date = Some("2024-06-01".to_string());

        assert_eq!(
            reading_end_key(FieldValue::Null, &reading, now()),
            Some(now())
        );

        let unread = book(2, "Emma", "Jane Austen");
        assert_eq!(reading_end_key(FieldValue::Null, &unread, now()), None);
        assert_eq!(
            reading_end_key(FieldValue::Text("not a date"), &reading, now()),
            None
        );
    }

    #[test]
    fn test_numeric_fields_pass_through() {
        let mut book = book(42, "Dune", "Frank Herbert");
        book.year = Some(1965);
        assert_eq!(
            sortable_value(SortKey::Id, &book, &ctx()),
            Some(SortValue::Integer(42))
        );
        assert_eq!(
            sortable_value(SortKey::Year, &book, &ctx()),
            Some(SortValue::Integer(1965))
        );
        assert_eq!(sortable_value(SortKey::Rating, &book, &ctx()), None);
    }

    #[test]
    fn test_nulls_sort_last_in_both_directions() {
        let books = vec![
            rated(1, "Unrated", None),
            rated(2, "Two", Some(2)),
            rated(3, "Five", Some(5)),
        ];

        let asc = sort_records(books.clone(), SortKey::Rating, SortDirection::Ascending, &ctx());
        assert_eq!(titles(&asc), vec!["Two", "Five", "Unrated"]);

        let desc = sort_records(books, SortKey::Rating, SortDirection::Descending, &ctx());
        assert_eq!(titles(&desc), vec!["Five", "Two", "Unrated"]);
    }

    #[test]
    fn test_zero_is_a_value_under_strict_policy() {
        let mut zero = book(1, "Zero", "A");
        zero.year = Some(0);
        let mut later = book(2, "Later", "B");
        later.year = Some(1990);
        let books = vec![later, zero];

        let strict = sort_records(books.clone(), SortKey::Year, SortDirection::Ascending, &ctx());
        assert_eq!(titles(&strict), vec!["Zero", "Later"]);

        let falsy_ctx = ctx().with_null_policy(NullPolicy::Falsy);
        let falsy = sort_records(books, SortKey::Year, SortDirection::Ascending, &falsy_ctx);
        assert_eq!(titles(&falsy), vec!["Later", "Zero"]);
    }

    #[test]
    fn test_rating_tie_falls_back_to_title() {
        let mut beta = book(1, "Beta", "Z Author");
        beta.rating = Some(3);
        let mut alpha = book(2, "Alpha", "A Author");
        alpha.rating = Some(3);

        let sorted = sort_records(vec![beta, alpha], SortKey::Rating, SortDirection::Ascending, &ctx());
        assert_eq!(titles(&sorted), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_title_tie_falls_back_to_author() {
        let books = vec![
            book(1, "Collected Stories", "Guy de Maupassant"),
            book(2, "Collected Stories", "Ursula K. Le Guin"),
        ];

        let sorted = sort_records(books, SortKey::Title, SortDirection::Ascending, &ctx());
        assert_eq!(sorted[0].author, "Ursula K. Le Guin");
        assert_eq!(sorted[1].author, "Guy de Maupassant");
    }

    #[test]
    fn test_compare_is_antisymmetric() {
        let mut books = vec![
            rated(1, "The Hobbit", Some(4)),
            rated(2, "Hobbit", Some(4)),
            rated(3, "Emma", None),
            rated(4, "Dune", Some(1)),
            rated(5, "Emma", None),
        ];
        books[2].read_start_date = Some("2024-01-01".to_string());
        books[3].read_end_date = Some("2020-03-03".to_string());

        for key in SortKey::ALL {
            for direction in [SortDirection::Ascending, SortDirection::Descending] {
                for a in &books {
                    for b in &books {
                        assert_eq!(
                            compare(a, b, key, direction, &ctx()),
                            compare(b, a, key, direction, &ctx()).reverse(),
                            "{} {} {} vs {}",
                            key,
                            direction,
                            a.id,
                            b.id
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_sorted_order_matches_comparator_and_is_idempotent() {
        let mut books = vec![
            book(5, "The Grapes of Wrath", "John Steinbeck"),
            book(2, "Crime and Punishment", "Fyodor Dostoevsky"),
            book(9, "A Wizard of Earthsea", "Ursula K. Le Guin"),
            book(1, "Bel-Ami", "Guy de Maupassant"),
            book(7, "Wizard of Earthsea", "Ursula K. Le Guin"),
        ];
        books[0].rating = Some(5);
        books[3].rating = Some(5);
        books[1].year = Some(1866);

        for key in SortKey::ALL {
            for direction in [SortDirection::Ascending, SortDirection::Descending] {
                let mut expected = books.clone();
                expected.sort_by(|a, b| compare(a, b, key, direction, &ctx()));

                let sorted = sort_records(books.clone(), key, direction, &ctx());
                assert_eq!(sorted, expected, "{} {}", key, direction);

                let again = sort_records(sorted.clone(), key, direction, &ctx());
                assert_eq!(again, sorted);
            }
        }
    }

    #[test]
    fn test_true_ties_keep_input_order() {
        let books = vec![
            book(3, "Emma", "Jane Austen"),
            book(1, "Emma", "Jane Austen"),
            book(2, "Emma", "Jane Austen"),
        ];

        let sorted = sort_records(books, SortKey::Rating, SortDirection::Descending, &ctx());
        let ids: Vec<i64> = sorted.iter().map(|b| b.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_in_progress_book_sorts_at_now() {
        let mut finished_long_ago = book(1, "Old", "A");
        finished_long_ago.read_start_date = Some("2019-01-01".to_string());
        finished_long_ago.read_end_date = Some("2019-02-01".to_string());

        let mut finished_last_week = book(2, "Recent", "B");
        finished_last_week.read_start_date = Some("2024-06-01".to_string());
        finished_last_week.read_end_date =
            Some((now() - Duration::days(7)).format("%Y-%m-%d").to_string());

        let mut in_progress = book(3, "Current", "C");
        in_progress.read_start_date = Some("2024-06-10".to_string());

        let never_started = book(4, "Unread", "D");

        let books = vec![in_progress, never_started, finished_long_ago, finished_last_week];

        let asc = sort_records(books.clone(), SortKey::ReadEndDate, SortDirection::Ascending, &ctx());
        assert_eq!(titles(&asc), vec!["Old", "Recent", "Current", "Unread"]);

        let desc = sort_records(books, SortKey::ReadEndDate, SortDirection::Descending, &ctx());
        assert_eq!(titles(&desc), vec!["Current", "Recent", "Old", "Unread"]);
    }

    #[test]
    fn test_malformed_end_date_sorts_with_unset() {
        let mut broken = book(1, "Broken", "A");
        broken.read_start_date = Some("2024-01-01".to_string());
        broken.read_end_date = Some("31/12/2023".to_string());

        let mut dated = book(2, "Dated", "B");
        dated.read_end_date = Some("2023-12-31".to_string());

        let asc = sort_records(vec![broken.clone(), dated.clone()], SortKey::ReadEndDate, SortDirection::Ascending, &ctx());
        assert_eq!(titles(&asc), vec!["Dated", "Broken"]);

        let desc = sort_records(vec![broken, dated], SortKey::ReadEndDate, SortDirection::Descending, &ctx());
        assert_eq!(titles(&desc), vec!["Dated", "Broken"]);
    }

    #[test]
    fn test_absent_field_compares_equal() {
        let with_year = raw(json!({"id": 1, "title": "Zed", "year": 2001}));
        let without_year = raw(json!({"id": 2, "title": "Aardvark"}));

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            assert_eq!(
                compare(&with_year, &without_year, SortKey::Year, direction, &ctx()),
                Ordering::Equal
            );
            assert_eq!(
                compare(&without_year, &with_year, SortKey::Year, direction, &ctx()),
                Ordering::Equal
            );
        }
    }

    #[test]
    fn test_records_without_key_keep_their_slot() {
        let records = vec![
            raw(json!({"id": 1, "title": "C", "year": 2003})),
            raw(json!({"id": 2, "title": "Keyless"})),
            raw(json!({"id": 3, "title": "A", "year": 2001})),
            raw(json!({"id": 4, "title": "B", "year": 2002})),
        ];

        let sorted = sort_records(records, SortKey::Year, SortDirection::Ascending, &ctx());
        let ids: Vec<i64> = sorted.iter().filter_map(|r| r.record_id()).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }
}
