//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must implement.
//!
//! ## Overview
//!
//! This crate defines the contract between the library core and the
//! platform it runs on. Each trait is a capability the core requires but
//! that differs per host (browser, desktop shell, headless tests).
//!
//! ## Traits
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preference storage
//!
//! ### Layout
//! - [`Viewport`](viewport::Viewport) - Scroll root that hands out observers
//! - [`VisibilityObserver`](viewport::VisibilityObserver) - Intersection records for elements
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](sink::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop / headless | `bridge-desktop` | ✅ Available |
//! | Web      | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it with an actionable message.

pub mod error;
pub mod platform;
pub mod sink;
pub mod storage;
pub mod time;
pub mod viewport;

pub use error::BridgeError;

// Re-export commonly used types
pub use storage::SettingsStore;
pub use sink::{LogLevel, LogRecord, LoggerSink};
pub use time::{Clock, FixedClock, SystemClock};
pub use viewport::{
    ElementId, IntersectionEntry, ObserverOptions, RootMargin, Viewport, VisibilityObserver,
};
