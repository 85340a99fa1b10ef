//! In-context event bus.
//!
//! Listeners subscribe to an exact event name, either the slot name (aggregate
//! changes) or `"<slot>:<key>"` (one key). Publishing is synchronous: every
//! matching listener has run when `publish` returns.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::core::Notifier;

type Listener = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry {
    id: ListenerId,
    event: String,
    listener: Listener,
}

/// Synchronous listener registry implementing [`Notifier`].
#[derive(Default)]
pub struct EventBus {
    entries: RwLock<Vec<Entry>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event`. Listeners run in registration order.
    pub fn subscribe<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push(Entry {
            id,
            event: event.into(),
            listener: Arc::new(listener),
        });
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.event == event)
            .count()
    }
}

impl Notifier for EventBus {
    fn publish(&self, event: &str, payload: Option<&Value>) {
        // Collect first so listeners may (un)subscribe while being called.
        let listeners: Vec<Listener> = self
            .entries
            .read()
            .iter()
            .filter(|entry| entry.event == event)
            .map(|entry| entry.listener.clone())
            .collect();

        for listener in listeners {
            listener(payload);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.entries.read().len())
            .finish()
    }
}
