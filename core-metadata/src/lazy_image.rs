//! Viewport-driven lazy loading of cover images
//!
//! Each cover starts as a placeholder with an empty source. Once its
//! placeholder intersects the scroll root (at least 10% visible, with a
//! 50px margin below the fold) the real source is revealed and stays
//! revealed for the rest of the session, even if the element scrolls out of
//! view again.
//!
//! State is tracked per element and source. For a given pair it moves
//! through [`ElementState`] in one direction only:
//! `Unobserved -> Observed -> Revealed`. Registering an element with a
//! different source replaces the pair, so the element starts again from
//! the state of its new source.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use bridge_traits::viewport::{ElementId, IntersectionEntry, ObserverOptions, Viewport, VisibilityObserver};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    Unobserved,
    Observed,
    Revealed,
}

/// Outcome reported by the host for an `<img>`-like element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEvent {
    Load,
    Error,
}

#[derive(Debug)]
struct TrackedImage {
    src: String,
    state: ElementState,
}

/// Reveals image sources as their placeholders come into view
pub struct LazyImageLoader {
    observer: Arc<dyn VisibilityObserver>,
    threshold: f64,
    elements: BTreeMap<ElementId, TrackedImage>,
    /// Sources that have been revealed; never shrinks
    revealed: HashSet<String>,
    torn_down: bool,
}

impl LazyImageLoader {
    /// Create a loader observing through a new observer from `viewport`
    pub fn new(viewport: &dyn Viewport, options: ObserverOptions) -> Result<Self> {
        let observer = viewport.create_observer(options)?;
        Ok(Self::with_observer(observer))
    }

    /// Create a loader with the default lazy-image observer options
    pub fn for_viewport(viewport: &dyn Viewport) -> Result<Self> {
        Self::new(viewport, ObserverOptions::lazy_image())
    }

    pub fn with_observer(observer: Arc<dyn VisibilityObserver>) -> Self {
        let threshold = observer.options().threshold;
        Self {
            observer,
            threshold,
            elements: BTreeMap::new(),
            revealed: HashSet::new(),
            torn_down: false,
        }
    }

    /// Track a placeholder element for `src`
    ///
    /// Already revealed sources are shown immediately without observing.
    /// Registering again with the same source keeps the current state; a
    /// new source is tracked as a fresh element.
    pub fn register(&mut self, element: ElementId, src: impl Into<String>) -> Result<ElementState> {
        if self.torn_down {
            return Ok(ElementState::Unobserved);
        }

        let src = src.into();
        if let Some(existing) = self.elements.get(&element) {
            if existing.src == src {
                return Ok(existing.state);
            }
        }

        let state = if self.revealed.contains(&src) {
            if self.elements.contains_key(&element) {
                self.observer.unobserve(element)?;
            }
            ElementState::Revealed
        } else {
            self.observer.observe(element)?;
            ElementState::Observed
        };

        trace!(element = %element, src = %src, state = ?state, "Registered lazy image");
        self.elements.insert(element, TrackedImage { src, state });
        Ok(state)
    }

    /// Stop tracking an element that left the layout
    pub fn unregister(&mut self, element: ElementId) {
        if let Some(tracked) = self.elements.remove(&element) {
            if tracked.state == ElementState::Observed {
                if let Err(e) = self.observer.unobserve(element) {
                    warn!(element = %element, error = %e, "Failed to unobserve image placeholder");
                }
            }
        }
    }

    /// Apply intersection records, returning the sources revealed by them
    pub fn handle_entries(&mut self, entries: &[IntersectionEntry]) -> Vec<String> {
        if self.torn_down {
            return Vec::new();
        }

        let mut newly_revealed = Vec::new();
        for entry in entries {
            if !entry.meets(self.threshold) {
                continue;
            }
            let src = match self.elements.get(&entry.target) {
                Some(tracked) if tracked.state == ElementState::Observed => tracked.src.clone(),
                _ => continue,
            };

            if self.revealed.insert(src.clone()) {
                debug!(element = %entry.target, src = %src, "Revealed cover image");
                newly_revealed.push(src.clone());
            }
            self.mark_revealed(&src);
        }
        newly_revealed
    }

    /// Drain pending records from the observer and apply them
    pub fn poll(&mut self) -> Vec<String> {
        if self.torn_down {
            return Vec::new();
        }
        let records = self.observer.take_records();
        self.handle_entries(&records)
    }

    /// Every element showing `src` is revealed and no longer observed
    fn mark_revealed(&mut self, src: &str) {
        for (element, tracked) in self.elements.iter_mut() {
            if tracked.src == src && tracked.state == ElementState::Observed {
                tracked.state = ElementState::Revealed;
                if let Err(e) = self.observer.unobserve(*element) {
                    warn!(element = %element, error = %e, "Failed to unobserve revealed image");
                }
            }
        }
    }

    /// Source the element should currently render; empty until revealed
    pub fn rendered_src(&self, element: ElementId) -> &str {
        match self.elements.get(&element) {
            Some(tracked) if self.revealed.contains(&tracked.src) => &tracked.src,
            _ => "",
        }
    }

    /// Filter a load or error event fired by an element
    ///
    /// Events fired while the element still shows its placeholder are
    /// dropped.
    pub fn on_image_event(&self, element: ElementId, src: &str, event: ImageEvent) -> Option<ImageEvent> {
        let rendered = self.rendered_src(element);
        if rendered.is_empty() || rendered != src {
            trace!(element = %element, event = ?event, "Ignored placeholder image event");
            return None;
        }
        Some(event)
    }

    pub fn state(&self, element: ElementId) -> ElementState {
        self.elements
            .get(&element)
            .map(|tracked| tracked.state)
            .unwrap_or(ElementState::Unobserved)
    }

    pub fn is_revealed(&self, src: &str) -> bool {
        self.revealed.contains(src)
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    /// Disconnect the observer and ignore anything that arrives later
    ///
    /// The revealed set is kept.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.observer.disconnect();
        self.elements.clear();
        self.torn_down = true;
        debug!(revealed = self.revealed.len(), "Lazy image loader torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for LazyImageLoader {
    fn drop(&mut self) {
        if !self.torn_down {
            self.observer.disconnect();
        }
    }
}
