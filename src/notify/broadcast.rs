//! Broadcast notifier for async consumers.
//!
//! Every published event is sent to all current receivers as a [`SyncEvent`].
//! A receiver that falls more than the channel capacity behind observes
//! `RecvError::Lagged` and loses the oldest events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::core::Notifier;

/// Default capacity of the broadcast channel.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 1024;

/// One published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    /// Event name: the slot name, or `"<slot>:<key>"`.
    pub name: String,
    /// Payload; absent for a per-key deletion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// [`Notifier`] backed by a `tokio::sync::broadcast` channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<SyncEvent>,
}

impl BroadcastNotifier {
    /// Create a notifier with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BROADCAST_CAPACITY)
    }

    /// Create a notifier whose channel holds `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, event: &str, payload: Option<&Value>) {
        // No receivers is not an error.
        let _ = self.tx.send(SyncEvent {
            name: event.to_string(),
            payload: payload.cloned(),
        });
    }
}
