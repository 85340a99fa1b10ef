//! High-level client API for tabsync.
//!
//! Provides [`SyncClient`], the per-context facade, and (with the `runtime`
//! feature) the background poll loop that drives it.

#[allow(clippy::module_inception)]
mod client;
#[cfg(feature = "runtime")]
mod poller;

pub use client::SyncClient;
