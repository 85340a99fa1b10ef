//! Built-in [`Notifier`](crate::core::Notifier) implementations.
//!
//! - [`EventBus`]: synchronous listeners keyed by event name
//! - [`BroadcastNotifier`]: fan-out to async receivers (requires `runtime`)

#[cfg(feature = "runtime")]
mod broadcast;
mod bus;

#[cfg(feature = "runtime")]
pub use broadcast::*;
pub use bus::{EventBus, ListenerId};
