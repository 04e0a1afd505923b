//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the library core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the other core crates
//! depend on. It establishes the logging conventions, the validated
//! [`CoreConfig`](config::CoreConfig) handed to the service layer, and the
//! broadcast channel used to publish list and cover events to the host.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, FeatureFlags};
pub use error::{Error, Result};
pub use events::{CoreEvent, CoverEvent, EventBus, EventSeverity, EventStream, LibraryEvent};
