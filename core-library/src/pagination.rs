//! Infinite-scroll window over a derived list

use serde::Serialize;

/// Records revealed per page
pub const PAGE_SIZE: usize = 20;

/// Prefix of a derived list that is currently displayed
///
/// # Examples
///
/// ```
/// use core_library::pagination::ScrollWindow;
///
/// let mut window = ScrollWindow::new(20);
/// window.reset(45);
/// assert_eq!(window.displayed(), 20);
/// assert!(window.has_more());
///
/// window.load_more();
/// window.load_more();
/// assert_eq!(window.displayed(), 45);
/// assert!(!window.has_more());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrollWindow {
    page_size: usize,
    total: usize,
    displayed: usize,
    has_more: bool,
}

impl ScrollWindow {
    /// Create an empty window; a zero page size is raised to one
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            total: 0,
            displayed: 0,
            has_more: false,
        }
    }

    /// Start over on a freshly derived list of `total` records
    pub fn reset(&mut self, total: usize) {
        self.total = total;
        self.displayed = total.min(self.page_size);
        self.has_more = total > self.page_size;
    }

    /// Reveal the next page, returning how many records were appended
    ///
    /// A short page means the end was reached. Once exhausted this is a
    /// no-op until the next [`reset`](Self::reset).
    pub fn load_more(&mut self) -> usize {
        if !self.has_more {
            return 0;
        }

        let appended = self.page_size.min(self.total.saturating_sub(self.displayed));
        self.displayed += appended;
        if appended < self.page_size {
            self.has_more = false;
        }
        appended
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of records currently displayed
    pub fn displayed(&self) -> usize {
        self.displayed
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }
}

impl Default for ScrollWindow {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

/// Proof that a sentinel trigger was armed under a given derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SentinelTicket {
    generation: u64,
}

impl SentinelTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Outcome of a sentinel intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelOutcome {
    /// A page was appended
    Loaded(usize),
    /// Nothing left to load
    Exhausted,
    /// Armed under a derivation that has since been replaced
    Stale,
    /// The window has not grown since the previous trigger
    Duplicate,
}

/// Admits at most one load per sentinel intersection
///
/// Every derivation re-arms the guard under a new generation. A trigger is
/// admitted when it carries the current generation and the window has grown
/// since the last admitted trigger.
#[derive(Debug, Clone, Default)]
pub struct SentinelGuard {
    generation: u64,
    last_trigger_at: Option<usize>,
}

impl SentinelGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, invalidating outstanding tickets
    pub fn rearm(&mut self) -> SentinelTicket {
        self.generation = self.generation.wrapping_add(1);
        self.last_trigger_at = None;
        self.ticket()
    }

    /// Ticket for the current generation
    pub fn ticket(&self) -> SentinelTicket {
        SentinelTicket {
            generation: self.generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check a trigger against the current generation and window length
    pub fn admit(&mut self, ticket: SentinelTicket, displayed: usize) -> Result<(), SentinelOutcome> {
        if ticket.generation != self.generation {
            return Err(SentinelOutcome::Stale);
        }
        if self.last_trigger_at == Some(displayed) {
            return Err(SentinelOutcome::Duplicate);
        }
        self.last_trigger_at = Some(displayed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_more_past_total_stops() {
        let mut window = ScrollWindow {
            page_size: 20,
            total: 5,
            displayed: 10,
            has_more: true,
        };

        assert_eq!(window.load_more(), 0);
        assert!(!window.has_more());
        assert_eq!(window.displayed(), 10);
        assert_eq!(window.load_more(), 0);
    }

    #[test]
    fn test_walk_45_records() {
        let mut window = ScrollWindow::default();
        window.reset(45);
        assert_eq!((window.displayed(), window.has_more()), (20, true));

        assert_eq!(window.load_more(), 20);
        assert_eq!((window.displayed(), window.has_more()), (40, true));

        assert_eq!(window.load_more(), 5);
        assert_eq!((window.displayed(), window.has_more()), (45, false));

        assert_eq!(window.load_more(), 0);
        assert_eq!(window.displayed(), 45);
    }

    #[test]
    fn test_exact_multiple_needs_one_empty_load() {
        let mut window = ScrollWindow::new(20);
        window.reset(40);
        assert_eq!(window.load_more(), 20);
        assert!(window.has_more());

        assert_eq!(window.load_more(), 0);
        assert!(!window.has_more());
        assert_eq!(window.displayed(), 40);
    }

    #[test]
    fn test_small_and_empty_lists() {
        let mut window = ScrollWindow::new(20);
        window.reset(0);
        assert_eq!((window.displayed(), window.has_more()), (0, false));

        window.reset(20);
        assert_eq!((window.displayed(), window.has_more()), (20, false));

        window.reset(7);
        assert_eq!((window.displayed(), window.has_more()), (7, false));
    }

    #[test]
    fn test_reset_after_growth() {
        let mut window = ScrollWindow::new(20);
        window.reset(100);
        window.load_more();
        window.load_more();
        assert_eq!(window.displayed(), 60);

        window.reset(30);
        assert_eq!((window.displayed(), window.has_more()), (20, true));
    }

    #[test]
    fn test_zero_page_size_is_raised() {
        let window = ScrollWindow::new(0);
        assert_eq!(window.page_size(), 1);
    }

    #[test]
    fn test_guard_rejects_stale_ticket() {
        let mut guard = SentinelGuard::new();
        let old = guard.rearm();
        let current = guard.rearm();

        assert_eq!(guard.admit(old, 20), Err(SentinelOutcome::Stale));
        assert_eq!(guard.admit(current, 20), Ok(()));
    }

    #[test]
    fn test_guard_rejects_repeat_without_growth() {
        let mut guard = SentinelGuard::new();
        let ticket = guard.rearm();

        assert_eq!(guard.admit(ticket, 20), Ok(()));
        assert_eq!(guard.admit(ticket, 20), Err(SentinelOutcome::Duplicate));
        assert_eq!(guard.admit(ticket, 40), Ok(()));
    }

    #[test]
    fn test_rearm_clears_last_trigger() {
        let mut guard = SentinelGuard::new();
        let first = guard.rearm();
        assert_eq!(guard.admit(first, 20), Ok(()));

        let second = guard.rearm();
        assert_eq!(guard.admit(second, 20), Ok(()));
        assert_eq!(second.generation(), first.generation() + 1);
    }
}
