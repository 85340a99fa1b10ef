//! Engine settings.
//!
//! [`Settings`] is fixed once an engine is built. It is assembled either with
//! [`SettingsBuilder`] or from a serialized [`SyncOptions`] record plus a store.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{
    ConfigError, Store, DEFAULT_DELAY, DEFAULT_DELAY_MS, DEFAULT_EXPIRES, DEFAULT_PATH,
    DEFAULT_SLOT_NAME, RESERVED_NAME_CHARS,
};
use crate::storage::CookieStore;

/// Immutable engine configuration.
#[derive(Clone)]
pub struct Settings {
    name: String,
    delay: Duration,
    expires: u32,
    path: String,
    storage: Arc<dyn Store>,
}

impl Settings {
    /// Start building settings from the defaults.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Slot name; also the aggregate event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delay between the end of one tick and the start of the next.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Lifetime of the persisted entry, in adapter-defined units.
    pub fn expires(&self) -> u32 {
        self.expires
    }

    /// Storage scoping path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The store holding the slot.
    pub fn storage(&self) -> &Arc<dyn Store> {
        &self.storage
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: DEFAULT_SLOT_NAME.to_string(),
            delay: DEFAULT_DELAY,
            expires: DEFAULT_EXPIRES,
            path: DEFAULT_PATH.to_string(),
            storage: Arc::new(CookieStore::shared()),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("name", &self.name)
            .field("delay", &self.delay)
            .field("expires", &self.expires)
            .field("path", &self.path)
            .field("storage", &self.storage.backend_name())
            .finish()
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Create a builder holding the default settings.
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    /// Set the slot name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = name.into();
        self
    }

    /// Set the poll delay.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.settings.delay = delay;
        self
    }

    /// Set the entry lifetime.
    pub fn expires(mut self, expires: u32) -> Self {
        self.settings.expires = expires;
        self
    }

    /// Set the scoping path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.settings.path = path.into();
        self
    }

    /// Set the store.
    pub fn storage(mut self, storage: Arc<dyn Store>) -> Self {
        self.settings.storage = storage;
        self
    }

    /// Validate and build the settings.
    pub fn build(self) -> Result<Settings, ConfigError> {
        let settings = self.settings;
        validate_name(&settings.name)?;
        if settings.delay.is_zero() {
            return Err(ConfigError::ZeroDelay);
        }
        if !settings.path.starts_with('/') {
            return Err(ConfigError::InvalidPath(settings.path));
        }
        Ok(settings)
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.contains(RESERVED_NAME_CHARS) {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Serializable form of the non-store settings.
///
/// Missing fields take their defaults, so `{}` is a valid options document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Slot name.
    pub name: String,
    /// Poll delay in milliseconds.
    pub delay_ms: u64,
    /// Entry lifetime.
    pub expires: u32,
    /// Scoping path.
    pub path: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_SLOT_NAME.to_string(),
            delay_ms: DEFAULT_DELAY_MS,
            expires: DEFAULT_EXPIRES,
            path: DEFAULT_PATH.to_string(),
        }
    }
}

impl SyncOptions {
    /// Parse options from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Combine the options with a store into validated settings.
    pub fn into_settings(self, storage: Arc<dyn Store>) -> Result<Settings, ConfigError> {
        SettingsBuilder::new()
            .name(self.name)
            .delay(Duration::from_millis(self.delay_ms))
            .expires(self.expires)
            .path(self.path)
            .storage(storage)
            .build()
    }
}

impl From<&Settings> for SyncOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            name: settings.name.clone(),
            delay_ms: u64::try_from(settings.delay.as_millis()).unwrap_or(u64::MAX),
            expires: settings.expires,
            path: settings.path.clone(),
        }
    }
}
