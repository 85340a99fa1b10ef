//! High-level tabsync client API.
//!
//! Provides [`SyncClient`], the facade one context uses to read and mutate the
//! shared object. Mutations apply immediately to the local state and reach other
//! contexts on the next tick of both sides.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::core::{Notifier, SharedObject, SyncResult};
use crate::sync::{Settings, SyncEngine, TickOutcome};

/// Engine plus the notifier its events go to.
pub(crate) struct Shared {
    engine: Mutex<SyncEngine>,
    notifier: Arc<dyn Notifier>,
}

impl Shared {
    fn new(settings: Settings, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            engine: Mutex::new(SyncEngine::new(settings)),
            notifier,
        }
    }

    /// Run `f` under the engine lock, then publish what it queued.
    ///
    /// Events are delivered after the lock is released so listeners can call
    /// back into the client.
    pub(crate) fn with_engine<R>(&self, f: impl FnOnce(&mut SyncEngine) -> R) -> R {
        let (result, notifications) = {
            let mut engine = self.engine.lock();
            let result = f(&mut engine);
            (result, engine.take_notifications())
        };
        for notification in notifications {
            self.notifier
                .publish(&notification.event, notification.payload.as_ref());
        }
        result
    }

    pub(crate) fn tick(&self) -> SyncResult<TickOutcome> {
        self.with_engine(SyncEngine::tick)
    }
}

/// Facade over one context's sync engine.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tabsync::prelude::*;
///
/// let store = MemoryStore::new();
/// let settings = Settings::builder().storage(Arc::new(store)).build()?;
/// let bus = Arc::new(EventBus::new());
/// bus.subscribe("sync:theme", |value| println!("theme is now {value:?}"));
///
/// let client = SyncClient::spawn(settings, bus);
/// client.set("theme", "dark");
/// ```
pub struct SyncClient {
    settings: Settings,
    shared: Arc<Shared>,
    #[cfg(feature = "runtime")]
    poller: Option<super::poller::Poller>,
}

impl SyncClient {
    /// Create a client without a background loop; drive it with [`tick`](Self::tick).
    pub fn new(settings: Settings, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            shared: Arc::new(Shared::new(settings.clone(), notifier)),
            settings,
            #[cfg(feature = "runtime")]
            poller: None,
        }
    }

    /// Create a client and start its poll loop on the current tokio runtime.
    ///
    /// The first tick runs immediately; each later tick starts `delay` after the
    /// previous one finished.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[cfg(feature = "runtime")]
    pub fn spawn(settings: Settings, notifier: Arc<dyn Notifier>) -> Self {
        let mut client = Self::new(settings, notifier);
        client.poller = Some(super::poller::Poller::spawn(
            client.shared.clone(),
            client.settings.delay(),
        ));
        client
    }

    /// The client's settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Deep copy of the current shared object.
    pub fn read(&self) -> SharedObject {
        self.shared.engine.lock().snapshot()
    }

    /// Value of one key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.shared.engine.lock().data().get(key).cloned()
    }

    /// True if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.shared.engine.lock().data().contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.shared.engine.lock().data().len()
    }

    /// True if the shared object has no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set one key. Setting `null` deletes the key.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        self.shared.with_engine(|engine| engine.apply(key, Some(value)));
    }

    /// Delete one key. Fires the key's event even if it was absent.
    pub fn delete(&self, key: &str) {
        self.shared.with_engine(|engine| engine.apply(key, None));
    }

    /// Apply every entry of `partial`; returns the resulting object.
    pub fn extend(&self, partial: SharedObject) -> SharedObject {
        self.shared.with_engine(|engine| {
            for (key, value) in partial {
                engine.apply(&key, Some(value));
            }
            engine.snapshot()
        })
    }

    /// Delete every key; returns the (empty) resulting object.
    pub fn clear(&self) -> SharedObject {
        self.shared.with_engine(|engine| {
            let keys: Vec<String> = engine.data().keys().cloned().collect();
            for key in keys {
                engine.apply(&key, None);
            }
            engine.snapshot()
        })
    }

    /// Bulk entry point taking any JSON value.
    ///
    /// An object extends, `null` or `false` clears, anything else changes
    /// nothing. Always returns the resulting object.
    pub fn write(&self, value: &Value) -> SharedObject {
        match value {
            Value::Object(partial) => self.extend(partial.clone()),
            Value::Null | Value::Bool(false) => self.clear(),
            _ => self.read(),
        }
    }

    /// Run one poll cycle now and publish its events.
    pub fn tick(&self) -> SyncResult<TickOutcome> {
        self.shared.tick()
    }

    /// True while the background poll loop is running.
    pub fn is_running(&self) -> bool {
        #[cfg(feature = "runtime")]
        {
            self.poller.as_ref().is_some_and(|poller| poller.is_running())
        }
        #[cfg(not(feature = "runtime"))]
        {
            false
        }
    }

    /// Signal the poll loop to stop after its current tick.
    #[cfg(feature = "runtime")]
    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.as_mut() {
            poller.stop();
        }
    }

    /// Stop the poll loop and wait for it to exit.
    #[cfg(feature = "runtime")]
    pub async fn shutdown(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }
    }
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("settings", &self.settings)
            .field("running", &self.is_running())
            .finish()
    }
}
