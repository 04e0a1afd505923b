//! Mounted book list sessions
//!
//! A [`BookListSession`] ties one [`BookListView`] to the host's scroll root:
//! an infinite-scroll sentinel observed with [`ObserverOptions::sentinel`],
//! a [`LazyImageLoader`] for cover placeholders, preference write-back and
//! event publishing. Everything here runs on the caller's thread; only the
//! preference writer runs as a task on the tokio runtime, saving changes in
//! the order they were made.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use bridge_traits::viewport::{
    ElementId, IntersectionEntry, ObserverOptions, Viewport, VisibilityObserver,
};
use bridge_traits::SettingsStore;
use core_library::{
    Book, BookListView, LibraryRecord, SentinelOutcome, SentinelTicket, SortDirection, SortKey,
    StatusFilter, ViewPreferences,
};
use core_metadata::{CoverCandidates, ElementState, ImageEvent, LazyImageLoader};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, CoverEvent, EventBus, EventStream, LibraryEvent};
use core_runtime::logging::{redact_if_sensitive, strip_path};

use crate::error::Result;

/// Entry point for hosts: owns the configuration and the event bus
pub struct LibraryService {
    config: CoreConfig,
    events: EventBus,
}

impl LibraryService {
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let events = EventBus::new(config.event_buffer_size);
        Ok(Self { config, events })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to list and cover events
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Preferences persisted by a previous session
    ///
    /// A failing store is logged and the defaults are used instead.
    pub async fn load_preferences(&self) -> ViewPreferences {
        match ViewPreferences::load(self.config.settings_store.as_ref()).await {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!(error = %e, "Failed to load list preferences; using defaults");
                ViewPreferences::default()
            }
        }
    }

    /// Mount a book list against `viewport`
    ///
    /// `sentinel` is the element placed after the last displayed record.
    pub async fn open_book_list<R: LibraryRecord>(
        &self,
        books: Vec<R>,
        viewport: &dyn Viewport,
        sentinel: ElementId,
    ) -> Result<BookListSession<R>> {
        let preferences = self.load_preferences().await;

        let listener = PreferenceWriter::spawn(
            Arc::clone(&self.config.settings_store),
            self.publisher(),
            self.config.features.persist_preferences,
        );
        let view = BookListView::builder()
            .preferences(preferences)
            .page_size(self.config.page_size)
            .clock(Arc::clone(&self.config.clock))
            .on_preferences_change(move |next| listener.changed(next))
            .build(books);

        let sentinel_observer = viewport.create_observer(ObserverOptions::sentinel())?;
        sentinel_observer.observe(sentinel)?;
        let images = LazyImageLoader::new(viewport, self.config.image_observer_options)?;

        let session = BookListSession {
            armed: view.sentinel_ticket(),
            view,
            sentinel,
            sentinel_observer,
            images,
            events: self.publisher(),
            mounted: true,
        };

        info!(
            total = session.view.records().len(),
            sort_key = %preferences.sort_key,
            sort_direction = %preferences.sort_direction,
            status_filter = %preferences.status_filter,
            "Opened book list"
        );
        session.publish_derived();
        Ok(session)
    }

    /// Record a cover picker thumbnail's natural size
    ///
    /// Returns `true` when the candidate was a blank placeholder and has been
    /// dropped from `candidates`.
    pub fn thumbnail_loaded(
        &self,
        candidates: &mut CoverCandidates,
        unique_id: &str,
        width: u32,
        height: u32,
    ) -> bool {
        let discarded = candidates.on_thumbnail_loaded(unique_id, width, height);
        if discarded {
            if let Some(events) = self.publisher() {
                events.publish(CoreEvent::Covers(CoverEvent::BlankDiscarded {
                    unique_id: unique_id.to_string(),
                }));
            }
        }
        discarded
    }

    /// Offer a local file as a cover, ahead of the Open Library candidates
    pub fn add_local_cover(&self, candidates: &mut CoverCandidates, uri: &str) -> String {
        let candidate = candidates.push_local_file(uri);
        debug!(file = %strip_path(uri), unique_id = %candidate.unique_id, "Added local cover candidate");
        candidate.unique_id.clone()
    }

    fn publisher(&self) -> Option<Publisher> {
        self.config
            .features
            .publish_events
            .then(|| Publisher(self.events.clone()))
    }
}

/// Event bus handle that ignores the no-subscriber case
#[derive(Clone)]
struct Publisher(EventBus);

impl Publisher {
    fn publish(&self, event: CoreEvent) {
        if let Ok(receivers) = self.0.emit(event) {
            trace!(receivers, "Published core event");
        }
    }
}

/// Listener installed on the view: persists and announces preference changes
struct PreferenceWriter {
    saves: Option<mpsc::UnboundedSender<ViewPreferences>>,
    events: Option<Publisher>,
}

impl PreferenceWriter {
    /// Start the writer task when persistence is on and a runtime is present
    fn spawn(store: Arc<dyn SettingsStore>, events: Option<Publisher>, persist: bool) -> Self {
        if !persist {
            return Self { saves: None, events };
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available; list preferences will not be saved");
            return Self { saves: None, events };
        };

        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(write_preferences(store, rx, events.clone()));
        Self {
            saves: Some(tx),
            events,
        }
    }

    fn changed(&self, preferences: &ViewPreferences) {
        let preferences = *preferences;

        if let Some(events) = &self.events {
            events.publish(CoreEvent::Library(LibraryEvent::PreferencesChanged {
                sort_key: preferences.sort_key.to_string(),
                sort_direction: preferences.sort_direction.to_string(),
                status_filter: preferences.status_filter.to_string(),
            }));
        }

        if let Some(saves) = &self.saves {
            if saves.send(preferences).is_err() {
                warn!("Preference writer has stopped; list preferences were not saved");
            }
        }
    }
}

/// Save queued preferences one at a time
///
/// Changes queued while a save is in flight collapse to the newest one, so
/// the store always ends on the last value sent. Runs until the session's
/// view is dropped and the queue is drained.
async fn write_preferences(
    store: Arc<dyn SettingsStore>,
    mut rx: mpsc::UnboundedReceiver<ViewPreferences>,
    events: Option<Publisher>,
) {
    while let Some(mut preferences) = rx.recv().await {
        let mut superseded = 0usize;
        while let Ok(newer) = rx.try_recv() {
            preferences = newer;
            superseded += 1;
        }

        match preferences.save(store.as_ref()).await {
            Ok(()) => trace!(superseded, "Saved list preferences"),
            Err(e) => {
                warn!(error = %e, "Failed to save list preferences");
                if let Some(events) = &events {
                    events.publish(CoreEvent::Library(LibraryEvent::PreferencesSaveFailed {
                        message: e.to_string(),
                    }));
                }
            }
        }
    }
    trace!("Preference writer stopped");
}

/// What one [`BookListSession::pump`] call did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Sentinel decisions, in arrival order
    pub sentinel: Vec<SentinelOutcome>,
    /// Cover sources revealed for the first time
    pub revealed: Vec<String>,
}

impl PumpReport {
    /// Number of records appended by sentinel triggers
    pub fn loaded(&self) -> usize {
        self.sentinel
            .iter()
            .map(|outcome| match outcome {
                SentinelOutcome::Loaded(n) => *n,
                _ => 0,
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sentinel.is_empty() && self.revealed.is_empty()
    }
}

/// A book list mounted against a scroll root
pub struct BookListSession<R = Book> {
    view: BookListView<R>,
    sentinel: ElementId,
    sentinel_observer: Arc<dyn VisibilityObserver>,
    /// Ticket the sentinel was last armed with
    armed: SentinelTicket,
    images: LazyImageLoader,
    events: Option<Publisher>,
    mounted: bool,
}

impl<R: LibraryRecord> BookListSession<R> {
    // =========================================================================
    // Collection and preference setters
    // =========================================================================

    pub fn set_books(&mut self, books: Vec<R>) {
        let total = books.len();
        self.view.set_books(books);
        if let Some(events) = &self.events {
            events.publish(CoreEvent::Library(LibraryEvent::CollectionReplaced { total }));
        }
        self.after_change();
    }

    pub fn replace_book(&mut self, book: R) -> bool {
        let replaced = self.view.replace_book(book);
        self.after_change();
        replaced
    }

    pub fn remove_book(&mut self, id: i64) -> Option<R> {
        let removed = self.view.remove_book(id);
        self.after_change();
        removed
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) -> bool {
        let term = term.into();
        trace!(search_term = %redact_if_sensitive("search_term", &term), "Search term set");
        let changed = self.view.set_search_term(term);
        self.after_change();
        changed
    }

    pub fn set_status_filter(&mut self, status_filter: StatusFilter) -> bool {
        let changed = self.view.set_status_filter(status_filter);
        self.after_change();
        changed
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) -> bool {
        let changed = self.view.set_sort_key(sort_key);
        self.after_change();
        changed
    }

    pub fn set_sort_direction(&mut self, sort_direction: SortDirection) -> bool {
        let changed = self.view.set_sort_direction(sort_direction);
        self.after_change();
        changed
    }

    pub fn toggle_sort_direction(&mut self) -> SortDirection {
        let direction = self.view.toggle_sort_direction();
        self.after_change();
        direction
    }

    pub fn set_preferences(&mut self, preferences: ViewPreferences) -> bool {
        let changed = self.view.set_preferences(preferences);
        self.after_change();
        changed
    }

    /// Re-arm the sentinel if the view was re-derived
    fn after_change(&mut self) {
        if !self.mounted || self.view.generation() == self.armed.generation() {
            return;
        }

        // Records queued before the derivation belong to the old ticket
        let sentinel = self.sentinel;
        let queued = self.sentinel_observer.take_records();
        for entry in queued.iter().filter(|entry| entry.target == sentinel && entry.meets(0.0)) {
            let outcome = self.view.handle_sentinel(self.armed);
            trace!(element = %entry.target, outcome = ?outcome, "Dropped queued sentinel record");
        }

        if let Err(e) = self.sentinel_observer.unobserve(self.sentinel) {
            warn!(element = %self.sentinel, error = %e, "Failed to unobserve sentinel");
        }
        self.armed = self.view.sentinel_ticket();
        if let Err(e) = self.sentinel_observer.observe(self.sentinel) {
            warn!(element = %self.sentinel, error = %e, "Failed to re-arm sentinel");
        }

        self.publish_derived();
    }

    fn publish_derived(&self) {
        if let Some(events) = &self.events {
            let window = self.view.window();
            events.publish(CoreEvent::Library(LibraryEvent::ViewDerived {
                generation: self.view.generation(),
                matched: window.total(),
                displayed: window.displayed(),
                has_more: window.has_more(),
            }));
        }
    }

    // =========================================================================
    // Observer plumbing
    // =========================================================================

    /// Apply sentinel intersection records
    ///
    /// Only entries for the sentinel element that are intersecting count as
    /// triggers; each of them gets one decision from the view.
    ///
    /// Entries carry no ticket, so they are judged against the sentinel as
    /// currently armed. Records queued before a re-derivation are drained
    /// and answered `Stale` when the view changes; entries a host holds on to
    /// across a change and passes in afterwards count as fresh triggers.
    pub fn handle_sentinel_entries(&mut self, entries: &[IntersectionEntry]) -> Vec<SentinelOutcome> {
        if !self.mounted {
            return Vec::new();
        }

        let threshold = self.sentinel_observer.options().threshold;
        let mut outcomes = Vec::new();
        for entry in entries {
            if entry.target != self.sentinel || !entry.meets(threshold) {
                continue;
            }
            let outcome = self.view.handle_sentinel(self.armed);
            if let SentinelOutcome::Loaded(_) = outcome {
                if let Some(events) = &self.events {
                    events.publish(CoreEvent::Library(LibraryEvent::PageLoaded {
                        generation: self.view.generation(),
                        displayed: self.view.window().displayed(),
                        has_more: self.view.has_more(),
                    }));
                }
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Drain both observers and apply what they reported
    pub fn pump(&mut self) -> PumpReport {
        if !self.mounted {
            return PumpReport::default();
        }

        let records = self.sentinel_observer.take_records();
        let sentinel = self.handle_sentinel_entries(&records);

        let revealed = self.images.poll();
        if let Some(events) = &self.events {
            for src in &revealed {
                events.publish(CoreEvent::Covers(CoverEvent::Revealed { src: src.clone() }));
            }
        }

        PumpReport { sentinel, revealed }
    }

    // =========================================================================
    // Cover images
    // =========================================================================

    /// Track a cover placeholder rendered for a displayed record
    pub fn register_cover(&mut self, element: ElementId, src: impl Into<String>) -> Result<ElementState> {
        Ok(self.images.register(element, src)?)
    }

    pub fn unregister_cover(&mut self, element: ElementId) {
        self.images.unregister(element);
    }

    /// Source a cover element should render right now
    pub fn rendered_src(&self, element: ElementId) -> &str {
        self.images.rendered_src(element)
    }

    /// Forward a load or error event fired by a cover element
    pub fn on_image_event(&self, element: ElementId, src: &str, event: ImageEvent) -> Option<ImageEvent> {
        let accepted = self.images.on_image_event(element, src, event)?;
        if let Some(events) = &self.events {
            let src = src.to_string();
            events.publish(CoreEvent::Covers(match accepted {
                ImageEvent::Load => CoverEvent::Loaded { src },
                ImageEvent::Error => CoverEvent::Failed { src },
            }));
        }
        Some(accepted)
    }

    pub fn images(&self) -> &LazyImageLoader {
        &self.images
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn view(&self) -> &BookListView<R> {
        &self.view
    }

    pub fn displayed(&self) -> Vec<&R> {
        self.view.displayed()
    }

    pub fn has_more(&self) -> bool {
        self.view.has_more()
    }

    pub fn preferences(&self) -> ViewPreferences {
        self.view.preferences()
    }

    pub fn sentinel(&self) -> ElementId {
        self.sentinel
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

impl<R> BookListSession<R> {
    /// Disconnect every observer; later records and events are ignored
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.sentinel_observer.disconnect();
        self.images.teardown();
        self.mounted = false;
        debug!(element = %self.sentinel, "Book list unmounted");
    }
}

impl<R> Drop for BookListSession<R> {
    fn drop(&mut self) {
        if self.mounted {
            self.sentinel_observer.disconnect();
        }
    }
}
