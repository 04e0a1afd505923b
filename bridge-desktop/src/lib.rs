//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and headless hosts
//! (macOS, Windows, Linux, test harnesses).
//!
//! ## Overview
//!
//! - `SettingsStore` using a JSON file in the user's config directory
//!   ([`JsonFileSettingsStore`]) or a process-local map ([`MemorySettingsStore`])
//! - `Viewport` computed from element rectangles and a scroll offset
//!   ([`GeometryViewport`])
//! - `LoggerSink` that keeps recent records in memory ([`RecordingSink`])
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{GeometryViewport, JsonFileSettingsStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = JsonFileSettingsStore::open_default().await.unwrap();
//!     let viewport = GeometryViewport::new(1280.0, 720.0);
//!
//!     // Use in core configuration
//! }
//! ```

mod log_sink;
mod settings;
mod viewport;

pub use log_sink::RecordingSink;
pub use settings::{JsonFileSettingsStore, MemorySettingsStore};
pub use viewport::{GeometryObserver, GeometryViewport, Rect};
