//! Core traits for tabsync.
//!
//! These traits define the two capabilities the sync engine consumes: a slot
//! store shared by every context, and a notifier local to one context.

use serde_json::Value;

use super::error::StoreResult;
use crate::sync::Settings;

/// Persistence for the serialized shared object.
///
/// Every context of a page group points its engine at the same store and slot.
/// Cross-context propagation happens only through this trait.
///
/// # Requirements
///
/// - `get` returns the blob most recently passed to `set` for the same slot,
///   or `None` if nothing (or nothing unexpired) is stored
/// - No atomicity is required: the engine treats the slot as last-writer-wins
/// - Failures are reported, never panicked on; the engine skips the tick
///
/// # Example
///
/// ```ignore
/// struct Single(parking_lot::Mutex<Option<String>>);
///
/// impl Store for Single {
///     fn backend_name(&self) -> &'static str {
///         "single"
///     }
///
///     fn get(&self, _settings: &Settings) -> StoreResult<Option<String>> {
///         Ok(self.0.lock().clone())
///     }
///
///     fn set(&self, _settings: &Settings, blob: &str) -> StoreResult<()> {
///         *self.0.lock() = Some(blob.to_owned());
///         Ok(())
///     }
/// }
/// ```
pub trait Store: Send + Sync {
    /// Short name of the backend, used in logs.
    fn backend_name(&self) -> &'static str;

    /// Read the blob stored in the slot named by `settings`.
    fn get(&self, settings: &Settings) -> StoreResult<Option<String>>;

    /// Replace the blob stored in the slot named by `settings`.
    fn set(&self, settings: &Settings, blob: &str) -> StoreResult<()>;
}

/// Delivery of named events to listeners in the current context.
///
/// Delivery is synchronous and local: nothing is queued and nothing crosses
/// into other contexts.
pub trait Notifier: Send + Sync {
    /// Publish `event` with an optional payload.
    ///
    /// `None` is the payload of a per-key deletion event.
    fn publish(&self, event: &str, payload: Option<&Value>);
}

/// A notifier that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn publish(&self, _event: &str, _payload: Option<&Value>) {}
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn publish(&self, event: &str, payload: Option<&Value>) {
        (**self).publish(event, payload)
    }
}
