//! Sync engine
//!
//! Owns the authoritative shared object of one context and reconciles it with
//! the persisted slot. Each call to [`SyncEngine::tick`] is one poll cycle:
//!
//! ```text
//! read slot ──► same text as local? ──yes──► done (no merge, no write)
//!                    │ no
//!                    ▼
//!              parse incoming
//!                    │
//!      diffA = diff(last, incoming)      apply each entry
//!      diffB = diff(last, local)         apply each entry (local wins ties)
//!      last  = data
//!      aggregate event if anything applied
//!                    │
//!                    ▼
//!              write slot once
//! ```
//!
//! The engine does not deliver events itself. [`SyncEngine::apply`] queues a
//! [`Notification`] and the owner drains them with
//! [`SyncEngine::take_notifications`] once it has released any lock around the
//! engine, so listeners may call back into the facade.

use serde_json::Value;
use tracing::{debug, trace};

use super::diff::{diff, DiffResult};
use super::settings::Settings;
use crate::core::{json_type_name, key_event_name, SharedObject, SyncError, SyncResult};

/// An event produced by the engine, waiting to be published.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Event name: the slot name, or `"<slot>:<key>"`.
    pub event: String,
    /// Event payload; `None` for a per-key deletion.
    pub payload: Option<Value>,
}

/// Result of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The slot held exactly the local state; nothing was merged or written.
    Unchanged,
    /// The slot differed and a merge cycle ran.
    Merged {
        /// Number of apply calls made by the merge.
        applied: usize,
    },
}

/// Diff-merge-notify engine for one context.
pub struct SyncEngine {
    settings: Settings,

    /// Authoritative local state
    data: SharedObject,

    /// State at the end of the last merge cycle (merge baseline)
    last: SharedObject,

    /// Events queued by `apply`, in program order
    outbox: Vec<Notification>,
}

impl SyncEngine {
    /// Create an engine with empty state.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            data: SharedObject::new(),
            last: SharedObject::new(),
            outbox: Vec::new(),
        }
    }

    /// The engine's settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Borrow the current state.
    pub fn data(&self) -> &SharedObject {
        &self.data
    }

    /// Deep copy of the current state.
    pub fn snapshot(&self) -> SharedObject {
        self.data.clone()
    }

    /// Set or delete one key and queue its per-key event.
    ///
    /// `None` and `Some(Value::Null)` both delete. The event is queued even when
    /// the value did not change or the key was already absent.
    pub fn apply(&mut self, key: &str, value: Option<Value>) {
        let value = value.filter(|v| !v.is_null());
        match &value {
            Some(v) => {
                self.data.insert(key.to_string(), v.clone());
            }
            None => {
                self.data.remove(key);
            }
        }
        self.outbox.push(Notification {
            event: key_event_name(self.settings.name(), key),
            payload: value,
        });
    }

    /// Apply every entry of `diff`; returns the number of apply calls.
    fn apply_diff(&mut self, diff: DiffResult) -> usize {
        let count = diff.len();
        for (key, value) in diff.changed {
            self.apply(&key, Some(value));
        }
        for key in diff.removed {
            self.apply(&key, None);
        }
        count
    }

    /// Merge an incoming persisted state into the local state.
    ///
    /// Remote changes (against the baseline) are applied first, then local
    /// changes made since the last cycle are re-applied on top, so a key changed
    /// on both sides ends with the local value. Returns the number of apply
    /// calls; when non-zero an aggregate event carrying the full state is queued.
    pub fn merge(&mut self, incoming: &SharedObject) -> usize {
        let local = self.data.clone();

        let remote = diff(&self.last, incoming);
        let local_changes = diff(&self.last, &local);
        trace!(
            remote = remote.len(),
            local = local_changes.len(),
            "merging slot {}",
            self.settings.name()
        );

        let applied = self.apply_diff(remote) + self.apply_diff(local_changes);
        self.last = self.data.clone();

        if applied > 0 {
            self.outbox.push(Notification {
                event: self.settings.name().to_string(),
                payload: Some(Value::Object(self.data.clone())),
            });
        }
        applied
    }

    /// Run one poll cycle against the store.
    ///
    /// On error the local state is left as it was before the cycle, except when
    /// the final write fails: the merged values stay in place but the baseline
    /// is rolled back, so the next cycle still sees them as local changes and
    /// persists them.
    pub fn tick(&mut self) -> SyncResult<TickOutcome> {
        let store = self.settings.storage().clone();
        let raw = store.get(&self.settings)?;
        let current = self.serialize()?;

        if raw.as_deref() == Some(current.as_str()) {
            trace!("slot {} unchanged", self.settings.name());
            return Ok(TickOutcome::Unchanged);
        }

        let incoming = match raw.as_deref() {
            Some(text) => parse_blob(text)?,
            None => SharedObject::new(),
        };

        let baseline = self.last.clone();
        let applied = self.merge(&incoming);
        let persisted = self
            .serialize()
            .and_then(|blob| store.set(&self.settings, &blob).map_err(SyncError::from));
        if let Err(e) = persisted {
            self.last = baseline;
            return Err(e);
        }

        debug!(
            applied,
            keys = self.data.len(),
            backend = store.backend_name(),
            "synced slot {}",
            self.settings.name()
        );
        Ok(TickOutcome::Merged { applied })
    }

    /// Drain queued notifications in the order they were produced.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    fn serialize(&self) -> SyncResult<String> {
        serde_json::to_string(&self.data).map_err(SyncError::Serialize)
    }
}

/// Read and parse the slot described by `settings` without writing anything.
///
/// An absent slot reads as an empty object.
pub fn load_slot(settings: &Settings) -> SyncResult<SharedObject> {
    match settings.storage().get(settings)? {
        Some(text) => parse_blob(&text),
        None => Ok(SharedObject::new()),
    }
}

/// Parse a persisted blob. JSON `null` reads as an empty object.
fn parse_blob(text: &str) -> SyncResult<SharedObject> {
    match serde_json::from_str::<Value>(text).map_err(SyncError::Malformed)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(SharedObject::new()),
        other => Err(SyncError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("settings", &self.settings)
            .field("keys", &self.data.len())
            .field("pending", &self.outbox.len())
            .finish()
    }
}
