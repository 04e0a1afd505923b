//! Filtered, sorted and paginated book list
//!
//! [`BookListView`] owns a flat collection plus the view state (search term,
//! status filter, sort key and direction). Any change that affects the
//! result re-derives the list from scratch and resets the scroll window.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, trace};

use bridge_traits::time::{Clock, SystemClock};

use crate::error::LibraryError;
use crate::models::{Book, ReadStatus};
use crate::pagination::{ScrollWindow, SentinelGuard, SentinelOutcome, SentinelTicket, PAGE_SIZE};
use crate::preferences::ViewPreferences;
use crate::record::LibraryRecord;
use crate::sort::{sorted_order, NullPolicy, SortContext, SortDirection, SortKey};

/// Which read statuses are listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    NotRead,
    Reading,
    Read,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::NotRead => "not_read",
            StatusFilter::Reading => "reading",
            StatusFilter::Read => "read",
        }
    }

    /// Status this filter selects, `None` for [`StatusFilter::All`]
    pub fn status(&self) -> Option<ReadStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::NotRead => Some(ReadStatus::NotRead),
            StatusFilter::Reading => Some(ReadStatus::Reading),
            StatusFilter::Read => Some(ReadStatus::Read),
        }
    }

    pub fn matches(&self, status: Option<ReadStatus>) -> bool {
        match self.status() {
            None => true,
            wanted => status == wanted,
        }
    }
}

impl From<ReadStatus> for StatusFilter {
    fn from(status: ReadStatus) -> Self {
        match status {
            ReadStatus::NotRead => StatusFilter::NotRead,
            ReadStatus::Reading => StatusFilter::Reading,
            ReadStatus::Read => StatusFilter::Read,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(StatusFilter::All);
        }
        s.parse::<ReadStatus>()
            .map(StatusFilter::from)
            .map_err(|_| LibraryError::InvalidInput {
                field: "status_filter".to_string(),
                message: format!("Unknown status filter '{}'", s),
            })
    }
}

/// Called with the new preferences whenever sort or filter change
pub type PreferencesListener = Box<dyn FnMut(&ViewPreferences) + Send>;

/// Builder for [`BookListView`]
pub struct BookListViewBuilder {
    preferences: ViewPreferences,
    search_term: String,
    page_size: usize,
    null_policy: NullPolicy,
    clock: Arc<dyn Clock>,
    listener: Option<PreferencesListener>,
}

impl BookListViewBuilder {
    fn new() -> Self {
        Self {
            preferences: ViewPreferences::default(),
            search_term: String::new(),
            page_size: PAGE_SIZE,
            null_policy: NullPolicy::default(),
            clock: Arc::new(SystemClock),
            listener: None,
        }
    }

    pub fn preferences(mut self, preferences: ViewPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn null_policy(mut self, null_policy: NullPolicy) -> Self {
        self.null_policy = null_policy;
        self
    }

    /// Clock consulted once per derivation for in-progress reading dates
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn on_preferences_change<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&ViewPreferences) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Build the view and run the first derivation
    pub fn build<R: LibraryRecord>(self, records: Vec<R>) -> BookListView<R> {
        let mut view = BookListView {
            records,
            preferences: self.preferences,
            search_term: self.search_term,
            null_policy: self.null_policy,
            clock: self.clock,
            listener: self.listener,
            ordered: Vec::new(),
            window: ScrollWindow::new(self.page_size),
            guard: SentinelGuard::new(),
        };
        view.derive();
        view
    }
}

/// Derived view over a book collection
///
/// # Examples
///
/// ```
/// use core_library::models::Book;
/// use core_library::sort::SortKey;
/// use core_library::view::BookListView;
///
/// let books = vec![
///     Book::new(1, "The Hobbit", "J. R. R. Tolkien"),
///     Book::new(2, "Emma", "Jane Austen"),
/// ];
/// let mut view = BookListView::builder().build(books);
/// view.set_sort_key(SortKey::Title);
///
/// let titles: Vec<&str> = view.displayed().iter().map(|b| b.title.as_str()).collect();
/// assert_eq!(titles, vec!["Emma", "The Hobbit"]);
/// ```
pub struct BookListView<R = Book> {
    records: Vec<R>,
    preferences: ViewPreferences,
    search_term: String,
    null_policy: NullPolicy,
    clock: Arc<dyn Clock>,
    listener: Option<PreferencesListener>,
    /// Indices into `records`, filtered and sorted
    ordered: Vec<usize>,
    window: ScrollWindow,
    guard: SentinelGuard,
}

impl BookListView<Book> {
    pub fn builder() -> BookListViewBuilder {
        BookListViewBuilder::new()
    }
}

impl<R: LibraryRecord> BookListView<R> {
    // =========================================================================
    // Collection edits
    // =========================================================================

    /// Replace the whole collection
    pub fn set_books(&mut self, records: Vec<R>) {
        self.records = records;
        self.derive();
    }

    /// Replace the record with the same id; `false` when there is none
    pub fn replace_book(&mut self, record: R) -> bool {
        let Some(id) = record.record_id() else {
            return false;
        };
        let Some(slot) = self.position_of(id) else {
            return false;
        };
        self.records[slot] = record;
        self.derive();
        true
    }

    /// Remove the record with the given id
    pub fn remove_book(&mut self, id: i64) -> Option<R> {
        let slot = self.position_of(id)?;
        let removed = self.records.remove(slot);
        self.derive();
        Some(removed)
    }

    fn position_of(&self, id: i64) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.record_id() == Some(id))
    }

    // =========================================================================
    // View state
    // =========================================================================

    /// Returns `true` when the list was re-derived
    pub fn set_search_term(&mut self, term: impl Into<String>) -> bool {
        let term = term.into();
        if term == self.search_term {
            return false;
        }
        self.search_term = term;
        self.derive();
        true
    }

    pub fn set_status_filter(&mut self, status_filter: StatusFilter) -> bool {
        self.update_preferences(ViewPreferences {
            status_filter,
            ..self.preferences
        })
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) -> bool {
        self.update_preferences(ViewPreferences {
            sort_key,
            ..self.preferences
        })
    }

    pub fn set_sort_direction(&mut self, sort_direction: SortDirection) -> bool {
        self.update_preferences(ViewPreferences {
            sort_direction,
            ..self.preferences
        })
    }

    pub fn toggle_sort_direction(&mut self) -> SortDirection {
        let next = self.preferences.sort_direction.toggled();
        self.set_sort_direction(next);
        next
    }

    /// Apply all three preferences at once
    pub fn set_preferences(&mut self, preferences: ViewPreferences) -> bool {
        self.update_preferences(preferences)
    }

    fn update_preferences(&mut self, next: ViewPreferences) -> bool {
        if next == self.preferences {
            return false;
        }
        self.preferences = next;
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.preferences);
        }
        self.derive();
        true
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    fn derive(&mut self) {
        let ctx = SortContext::new(self.clock.now()).with_null_policy(self.null_policy);
        let needle = self.search_term.to_lowercase();
        let status_filter = self.preferences.status_filter;

        let kept: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                needle.is_empty() || record.title().to_lowercase().contains(&needle)
            })
            .filter(|(_, record)| status_filter.matches(record.read_status()))
            .map(|(index, _)| index)
            .collect();

        let order = {
            let refs: Vec<&R> = kept.iter().map(|&index| &self.records[index]).collect();
            sorted_order(
                &refs,
                self.preferences.sort_key,
                self.preferences.sort_direction,
                &ctx,
            )
        };
        self.ordered = order.into_iter().map(|position| kept[position]).collect();

        self.window.reset(self.ordered.len());
        let ticket = self.guard.rearm();

        debug!(
            generation = ticket.generation(),
            total = self.records.len(),
            matched = self.ordered.len(),
            sort_key = %self.preferences.sort_key,
            sort_direction = %self.preferences.sort_direction,
            status_filter = %status_filter,
            "Derived book list"
        );
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Append the next page; returns the number of records added
    pub fn load_more(&mut self) -> usize {
        self.window.load_more()
    }

    /// Ticket for sentinel triggers armed under the current derivation
    pub fn sentinel_ticket(&self) -> SentinelTicket {
        self.guard.ticket()
    }

    /// React to the sentinel entering the viewport
    pub fn handle_sentinel(&mut self, ticket: SentinelTicket) -> SentinelOutcome {
        if let Err(rejected) = self.guard.admit(ticket, self.window.displayed()) {
            trace!(outcome = ?rejected, generation = ticket.generation(), "Sentinel trigger ignored");
            return rejected;
        }
        if !self.window.has_more() {
            return SentinelOutcome::Exhausted;
        }
        match self.window.load_more() {
            0 => SentinelOutcome::Exhausted,
            appended => {
                debug!(appended, displayed = self.window.displayed(), "Loaded next page");
                SentinelOutcome::Loaded(appended)
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Records currently shown, in order
    pub fn displayed(&self) -> Vec<&R> {
        self.ordered[..self.window.displayed()]
            .iter()
            .map(|&index| &self.records[index])
            .collect()
    }

    /// Every record that passed the filters, in order
    pub fn filtered_sorted(&self) -> Vec<&R> {
        self.ordered
            .iter()
            .map(|&index| &self.records[index])
            .collect()
    }

    pub fn has_more(&self) -> bool {
        self.window.has_more()
    }

    pub fn window(&self) -> &ScrollWindow {
        &self.window
    }

    /// Incremented on every derivation
    pub fn generation(&self) -> u64 {
        self.guard.generation()
    }

    pub fn preferences(&self) -> ViewPreferences {
        self.preferences
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }
}

impl<R> fmt::Debug for BookListView<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookListView")
            .field("records", &self.records.len())
            .field("preferences", &self.preferences)
            .field("search_term", &self.search_term)
            .field("window", &self.window)
            .field("generation", &self.guard.generation())
            .finish()
    }
}
