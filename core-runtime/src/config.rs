//! # Core Configuration Module
//!
//! Provides configuration management for the library core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host capabilities and settings the core needs.
//! It enforces fail-fast validation so a session never starts with a missing
//! bridge or an unusable setting.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - Required for persisted sort and filter preferences
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - Time source for in-progress reading dates (default: system clock)
//!
//! When the `desktop-shims` feature is enabled, a JSON-file `SettingsStore`
//! in the user's config directory is injected automatically if none is
//! provided.
//!
//! ## Usage
//!
//! ```
//! use bridge_desktop::MemorySettingsStore;
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .settings_store(Arc::new(MemorySettingsStore::new()))
//!     .page_size(30)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.page_size, 30);
//! assert!(config.features.persist_preferences);
//! ```
//!
//! ## Error Handling
//!
//! Invalid settings are reported with an actionable message:
//!
//! ```
//! use bridge_desktop::MemorySettingsStore;
//! use core_runtime::{config::CoreConfig, Error};
//! use std::sync::Arc;
//!
//! let result = CoreConfig::builder()
//!     .settings_store(Arc::new(MemorySettingsStore::new()))
//!     .page_size(0)
//!     .build();
//!
//! assert!(matches!(result, Err(Error::Config(_))));
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{Clock, ObserverOptions, SettingsStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;

/// Records revealed per infinite-scroll page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Core configuration for the library core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// User preferences storage (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Time source, consulted once per list derivation
    pub clock: Arc<dyn Clock>,

    /// Records revealed per infinite-scroll page
    pub page_size: usize,

    /// Observer options for lazily loaded cover images
    pub image_observer_options: ObserverOptions,

    /// Capacity of the event bus channel
    pub event_buffer_size: usize,

    /// Features flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("settings_store", &"SettingsStore { ... }")
            .field("clock", &"Clock { ... }")
            .field("page_size", &self.page_size)
            .field("image_observer_options", &self.image_observer_options)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Write sort and filter changes back to the settings store
    pub persist_preferences: bool,

    /// Publish library and cover events on the event bus
    pub publish_events: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            persist_preferences: true,
            publish_events: true,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Page size is greater than zero
    /// - Image observer threshold is within 0.0..=1.0
    /// - Image observer margins are finite and non-negative
    /// - Event buffer can hold at least one event
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config(
                "Page size must be greater than 0".to_string(),
            ));
        }

        let threshold = self.image_observer_options.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "Image observer threshold {} must be within 0.0..=1.0",
                threshold
            )));
        }

        let margin = self.image_observer_options.root_margin;
        let sides = [margin.top, margin.right, margin.bottom, margin.left];
        if sides.iter().any(|side| !side.is_finite() || *side < 0.0) {
            return Err(Error::Config(
                "Image observer root margin must be finite and non-negative".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for persisted sort and filter preferences. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default JsonFileSettingsStore. \
                 Web: inject a localStorage-based settings store. \
                 Tests: inject bridge_desktop::MemorySettingsStore."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::JsonFileSettingsStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let open_store = |path: Option<PathBuf>| -> Result<JsonFileSettingsStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default settings store: {}",
                    e
                ))
            })?;

        runtime
            .block_on(async move {
                match path {
                    Some(path) => JsonFileSettingsStore::open(path).await,
                    None => JsonFileSettingsStore::open_default().await,
                }
            })
            .map_err(Error::from)
    };

    // block_on panics inside a runtime, so open on a helper thread there
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || open_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => open_store(path)?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    settings_store: Option<Arc<dyn SettingsStore>>,
    settings_path: Option<PathBuf>,
    clock: Option<Arc<dyn Clock>>,
    page_size: Option<usize>,
    image_observer_options: Option<ObserverOptions>,
    event_buffer_size: Option<usize>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the settings store used for persisted preferences.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Location of the default JSON settings file.
    ///
    /// Only consulted when no store is injected and the `desktop-shims`
    /// feature supplies the default one.
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Sets the time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets how many records each infinite-scroll page reveals.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Overrides the observer options for lazily loaded cover images.
    pub fn image_observer_options(mut self, options: ObserverOptions) -> Self {
        self.image_observer_options = Some(options);
        self
    }

    /// Sets the event bus capacity.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn persist_preferences(mut self, enabled: bool) -> Self {
        self.features.persist_preferences = enabled;
        self
    }

    pub fn publish_events(mut self, enabled: bool) -> Self {
        self.features.publish_events = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns an error if:
    /// - No `SettingsStore` was provided and no default is available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.settings_path)?,
        };

        let config = CoreConfig {
            settings_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            image_observer_options: self
                .image_observer_options
                .unwrap_or_else(ObserverOptions::lazy_image),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
