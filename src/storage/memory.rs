//! In-process slot store.
//!
//! Clones share one slot table, so engines handed clones of the same
//! `MemoryStore` behave like contexts sharing one storage substrate. Slots are
//! keyed by name only; the scoping path is ignored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::core::{Store, StoreError, StoreResult};
use crate::sync::Settings;

#[derive(Debug, Default)]
struct Inner {
    slots: RwLock<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    latency: RwLock<Option<Duration>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

/// Shared in-memory [`Store`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current raw contents of a slot.
    pub fn slot(&self, name: &str) -> Option<String> {
        self.inner.slots.read().get(name).cloned()
    }

    /// Overwrite a slot directly, as another writer would.
    pub fn put(&self, name: &str, blob: &str) {
        self.inner
            .slots
            .write()
            .insert(name.to_string(), blob.to_string());
    }

    /// Remove a slot.
    pub fn remove(&self, name: &str) -> Option<String> {
        self.inner.slots.write().remove(name)
    }

    /// Make every read fail with [`StoreError::Unavailable`].
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with [`StoreError::Unavailable`].
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Block every read and write for `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.inner.latency.write() = latency;
    }

    /// Number of successful reads.
    pub fn read_count(&self) -> u64 {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn simulate_latency(&self) {
        let latency = *self.inner.latency.read();
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }
    }
}

impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, settings: &Settings) -> StoreResult<Option<String>> {
        self.simulate_latency();
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.slot(settings.name()))
    }

    fn set(&self, settings: &Settings, blob: &str) -> StoreResult<()> {
        self.simulate_latency();
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        self.put(settings.name(), blob);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
