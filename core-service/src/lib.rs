//! Core service façade and bootstrap helpers.
//!
//! This crate wires a validated [`CoreConfig`] (settings store, clock, page
//! size, observer options) into mounted book lists. Desktop apps typically
//! enable the `desktop-shims` feature, which lets the config fall back to a
//! JSON settings file from `bridge-desktop` when no store is injected.
//!
//! ```ignore
//! use bridge_desktop::{GeometryViewport, MemorySettingsStore};
//! use bridge_traits::viewport::ElementId;
//! use core_service::{CoreConfig, LibraryService};
//! use std::sync::Arc;
//!
//! # async fn run(books: Vec<core_library::Book>) -> core_service::Result<()> {
//! let config = CoreConfig::builder()
//!     .settings_store(Arc::new(MemorySettingsStore::new()))
//!     .build()?;
//! let service = LibraryService::new(config)?;
//!
//! let viewport = GeometryViewport::new(1280.0, 720.0);
//! let mut session = service.open_book_list(books, &viewport, ElementId(0)).await?;
//! session.set_search_term("dune");
//! session.pump();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod session;

pub use error::{CoreError, Result};
pub use session::{BookListSession, LibraryService, PumpReport};

pub use core_runtime::config::{CoreConfig, CoreConfigBuilder, FeatureFlags};
pub use core_runtime::events::{CoreEvent, CoverEvent, EventStream, LibraryEvent};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{GeometryViewport, JsonFileSettingsStore, MemorySettingsStore, Rect};
