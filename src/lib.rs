//! # tabsync
//!
//! Synchronizes one flat key-value object between independent contexts (browser
//! tabs, processes, test fixtures) that share nothing but a storage slot.
//!
//! Each context runs a [`SyncClient`]. Its engine polls the slot on a fixed
//! delay, three-way merges what it finds with its own baseline and local edits,
//! writes the result back, and emits events:
//!
//! - `"<name>"` once per merge cycle that changed anything, with the full object
//! - `"<name>:<key>"` once per key set or deleted, with the new value
//!
//! Contexts converge last-writer-wins per tick; when a key changed both locally
//! and in the slot since the last tick, the local value wins.
//!
//! ## Feature Flags
//!
//! - `runtime` (default): background poll loop and broadcast notifier (tokio)
//! - `cli`: the `tabsync` command-line tool over a shared directory
//!
//! ## Modules
//!
//! - [`core`]: Core traits, constants, and error types
//! - [`sync`]: Diff, merge engine, and settings
//! - [`storage`]: Built-in stores (cookie jar, memory, files)
//! - [`notify`]: Built-in notifiers (event bus, broadcast)
//! - [`client`]: The per-context facade and poll loop
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tabsync::prelude::*;
//!
//! // Two contexts sharing one cookie jar.
//! let jar = CookieStore::new();
//! let settings = Settings::builder()
//!     .storage(Arc::new(jar))
//!     .build()
//!     .unwrap();
//!
//! let left = SyncClient::new(settings.clone(), Arc::new(NullNotifier));
//! let right = SyncClient::new(settings, Arc::new(NullNotifier));
//!
//! left.set("theme", "dark");
//! left.tick().unwrap();
//! right.tick().unwrap();
//!
//! assert_eq!(right.get("theme"), Some(serde_json::json!("dark")));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

pub mod client;
pub mod notify;
pub mod storage;
pub mod sync;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::client::SyncClient;
    pub use crate::core::*;
    pub use crate::notify::{EventBus, ListenerId};
    pub use crate::storage::{CookieStore, FileStore, MemoryStore};
    pub use crate::sync::{
        DiffResult, Notification, Settings, SettingsBuilder, SyncEngine, SyncOptions, TickOutcome,
    };

    #[cfg(feature = "runtime")]
    pub use crate::notify::{BroadcastNotifier, SyncEvent};
}

// Re-export commonly used items at crate root
pub use client::SyncClient;
pub use crate::core::{Notifier, SharedObject, Store, StoreError, SyncError, TabsyncError};
pub use sync::{Settings, SyncOptions, TickOutcome};
