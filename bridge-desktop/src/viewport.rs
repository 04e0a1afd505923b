//! Rectangle-geometry viewport
//!
//! Headless hosts (desktop shells, tests, server-side renderers) know where
//! they laid elements out but have no browser `IntersectionObserver`. This
//! viewport computes intersections from those rectangles and a scroll
//! offset, emitting a record whenever an element crosses an observer's
//! threshold, plus one initial record when observation starts.

use bridge_traits::{
    error::{BridgeError, Result},
    viewport::{ElementId, IntersectionEntry, ObserverOptions, RootMargin, Viewport, VisibilityObserver},
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::trace;

/// Axis-aligned rectangle in content coordinates (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn right(&self) -> f64 {
        self.x + self.width
    }

    fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn expand(&self, margin: &RootMargin) -> Self {
        Self {
            x: self.x - margin.left,
            y: self.y - margin.top,
            width: self.width + margin.left + margin.right,
            height: self.height + margin.top + margin.bottom,
        }
    }

    /// Whether the rectangles touch or overlap, and the visible share of `self`
    fn intersection_with(&self, root: &Rect) -> (bool, f64) {
        let touching = self.x <= root.right()
            && self.right() >= root.x
            && self.y <= root.bottom()
            && self.bottom() >= root.y;
        if !touching {
            return (false, 0.0);
        }

        let area = self.width * self.height;
        if area <= 0.0 {
            return (true, 1.0);
        }

        let overlap_w = self.right().min(root.right()) - self.x.max(root.x);
        let overlap_h = self.bottom().min(root.bottom()) - self.y.max(root.y);
        let ratio = (overlap_w.max(0.0) * overlap_h.max(0.0)) / area;
        (true, ratio.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Default)]
struct Layout {
    root_size: (f64, f64),
    scroll: (f64, f64),
    elements: HashMap<ElementId, Rect>,
}

impl Layout {
    fn root_rect(&self) -> Rect {
        Rect::new(self.scroll.0, self.scroll.1, self.root_size.0, self.root_size.1)
    }

    fn entry_for(&self, target: ElementId, options: &ObserverOptions) -> IntersectionEntry {
        let root = self.root_rect().expand(&options.root_margin);
        let (is_intersecting, ratio) = self
            .elements
            .get(&target)
            .map(|rect| rect.intersection_with(&root))
            .unwrap_or((false, 0.0));
        IntersectionEntry::new(target, is_intersecting, ratio)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scroll root whose layout is described with [`Rect`]s
///
/// ```
/// use bridge_desktop::{GeometryViewport, Rect};
/// use bridge_traits::viewport::{ElementId, ObserverOptions, Viewport};
///
/// let viewport = GeometryViewport::new(400.0, 600.0);
/// viewport.set_element_rect(ElementId(1), Rect::new(0.0, 1000.0, 100.0, 150.0));
///
/// let observer = viewport.create_observer(ObserverOptions::lazy_image()).unwrap();
/// observer.observe(ElementId(1)).unwrap();
/// assert!(!observer.take_records()[0].is_intersecting);
///
/// viewport.scroll_to(0.0, 500.0);
/// assert!(observer.take_records()[0].meets(0.1));
/// ```
#[derive(Clone)]
pub struct GeometryViewport {
    layout: Arc<Mutex<Layout>>,
    observers: Arc<Mutex<Vec<Weak<GeometryObserver>>>>,
}

impl GeometryViewport {
    /// Create a root of the given visible size, scrolled to the origin
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            layout: Arc::new(Mutex::new(Layout {
                root_size: (width, height),
                ..Layout::default()
            })),
            observers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Place (or move) an element
    pub fn set_element_rect(&self, target: ElementId, rect: Rect) {
        lock(&self.layout).elements.insert(target, rect);
        self.notify();
    }

    /// Remove an element from the layout; it stops intersecting
    pub fn remove_element(&self, target: ElementId) {
        lock(&self.layout).elements.remove(&target);
        self.notify();
    }

    /// Scroll the root to an absolute offset
    pub fn scroll_to(&self, x: f64, y: f64) {
        lock(&self.layout).scroll = (x, y);
        self.notify();
    }

    /// Resize the visible area of the root
    pub fn resize(&self, width: f64, height: f64) {
        lock(&self.layout).root_size = (width, height);
        self.notify();
    }

    /// Current vertical scroll offset
    pub fn scroll_top(&self) -> f64 {
        lock(&self.layout).scroll.1
    }

    fn notify(&self) {
        let snapshot = lock(&self.layout).clone();
        let mut observers = lock(&self.observers);
        observers.retain(|weak| match weak.upgrade() {
            Some(observer) => {
                observer.recompute(&snapshot);
                true
            }
            None => false,
        });
    }
}

impl Viewport for GeometryViewport {
    fn create_observer(&self, options: ObserverOptions) -> Result<Arc<dyn VisibilityObserver>> {
        if !(0.0..=1.0).contains(&options.threshold) {
            return Err(BridgeError::OperationFailed(format!(
                "Observer threshold {} must be within 0.0..=1.0",
                options.threshold
            )));
        }

        let observer = Arc::new(GeometryObserver {
            layout: Arc::clone(&self.layout),
            options,
            state: Mutex::new(ObserverState::default()),
        });
        lock(&self.observers).push(Arc::downgrade(&observer));
        Ok(observer)
    }
}

#[derive(Debug, Default)]
struct ObserverState {
    /// Last reported "meets threshold" state per observed element
    observed: BTreeMap<ElementId, bool>,
    queue: Vec<IntersectionEntry>,
}

/// Observer handed out by [`GeometryViewport`]
pub struct GeometryObserver {
    layout: Arc<Mutex<Layout>>,
    options: ObserverOptions,
    state: Mutex<ObserverState>,
}

impl GeometryObserver {
    fn recompute(&self, layout: &Layout) {
        let mut state = lock(&self.state);
        let ObserverState { observed, queue } = &mut *state;
        for (target, last) in observed.iter_mut() {
            let entry = layout.entry_for(*target, &self.options);
            let visible = entry.meets(self.options.threshold);
            if visible != *last {
                *last = visible;
                trace!(element = %entry.target, ratio = entry.intersection_ratio, "Threshold crossed");
                queue.push(entry);
            }
        }
    }
}

impl VisibilityObserver for GeometryObserver {
    fn observe(&self, target: ElementId) -> Result<()> {
        let entry = lock(&self.layout).entry_for(target, &self.options);
        let mut state = lock(&self.state);
        if state.observed.contains_key(&target) {
            return Ok(());
        }
        state
            .observed
            .insert(target, entry.meets(self.options.threshold));
        state.queue.push(entry);
        Ok(())
    }

    fn unobserve(&self, target: ElementId) -> Result<()> {
        let mut state = lock(&self.state);
        state.observed.remove(&target);
        state.queue.retain(|entry| entry.target != target);
        Ok(())
    }

    fn disconnect(&self) {
        let mut state = lock(&self.state);
        state.observed.clear();
        state.queue.clear();
    }

    fn take_records(&self) -> Vec<IntersectionEntry> {
        std::mem::take(&mut lock(&self.state).queue)
    }

    fn options(&self) -> ObserverOptions {
        self.options
    }
}
