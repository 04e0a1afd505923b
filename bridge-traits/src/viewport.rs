//! Viewport Visibility Abstractions
//!
//! The core never inspects layout directly. A host hands it a [`Viewport`]
//! for a scrollable root; the core asks for [`VisibilityObserver`]s with the
//! options it needs and reads back [`IntersectionEntry`] records, mirroring
//! the browser `IntersectionObserver` model:
//!
//! - **Web**: a thin wrapper over `IntersectionObserver`
//! - **Desktop / headless**: rectangle geometry (`bridge-desktop`)
//! - **Tests**: scripted entries
//!
//! Records are pulled with [`VisibilityObserver::take_records`] or pushed by
//! the host into whatever consumer owns the observer; both flows deliver the
//! same entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{error::Result, platform::PlatformSendSync};

/// Opaque identity of an element the host can lay out (image placeholder,
/// list sentinel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Margin growing (positive) or shrinking (negative) the root's box before
/// intersections are computed, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RootMargin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl RootMargin {
    /// Margin that only extends the bottom edge
    pub fn bottom(px: f64) -> Self {
        Self {
            bottom: px,
            ..Self::default()
        }
    }
}

/// Options an observer is created with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverOptions {
    /// Minimum visible ratio (0.0..=1.0) for an entry to count as visible
    pub threshold: f64,
    /// Expansion applied to the root's box
    pub root_margin: RootMargin,
}

impl ObserverOptions {
    /// Options used for cover image placeholders: 10% visible within 50px
    /// below the root's bottom edge.
    pub fn lazy_image() -> Self {
        Self {
            threshold: 0.1,
            root_margin: RootMargin::bottom(50.0),
        }
    }

    /// Options used for the infinite-scroll sentinel: any overlap counts.
    pub fn sentinel() -> Self {
        Self::default()
    }
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: RootMargin::default(),
        }
    }
}

/// One visibility change reported for an observed element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionEntry {
    pub target: ElementId,
    /// Whether the element overlaps the (margin-expanded) root at all
    pub is_intersecting: bool,
    /// Visible share of the element's area, 0.0..=1.0
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    pub fn new(target: ElementId, is_intersecting: bool, intersection_ratio: f64) -> Self {
        Self {
            target,
            is_intersecting,
            intersection_ratio,
        }
    }

    /// True when the entry intersects with at least `threshold` of its area
    pub fn meets(&self, threshold: f64) -> bool {
        self.is_intersecting && self.intersection_ratio >= threshold
    }
}

/// Watches elements against one scroll root
pub trait VisibilityObserver: PlatformSendSync {
    /// Start watching an element. Hosts report its current state as the
    /// first record after this call.
    fn observe(&self, target: ElementId) -> Result<()>;

    /// Stop watching a single element
    fn unobserve(&self, target: ElementId) -> Result<()>;

    /// Stop watching every element and drop queued records
    fn disconnect(&self);

    /// Drain queued records in the order they were produced
    fn take_records(&self) -> Vec<IntersectionEntry>;

    /// Options this observer was created with
    fn options(&self) -> ObserverOptions;
}

/// A scrollable root that can hand out observers
pub trait Viewport: PlatformSendSync {
    fn create_observer(&self, options: ObserverOptions) -> Result<Arc<dyn VisibilityObserver>>;
}
