//! Workspace umbrella crate.
//!
//! Host applications can depend on `alexandria-workspace` and pick the
//! documented features instead of wiring each workspace crate individually.
//! With the default `desktop-shims` feature the service façade, the list
//! engine and the cover helpers are re-exported from one place.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;

#[cfg(feature = "desktop-shims")]
pub use core_library as library;

#[cfg(feature = "desktop-shims")]
pub use core_metadata as covers;
