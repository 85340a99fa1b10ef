//! tabsync - Sync Layer
//!
//! Implements:
//! - Flat structural diffs between shared objects
//! - The three-way merge of baseline, persisted and local state
//! - Per-key and aggregate change notifications
//! - Engine settings and serializable options

mod diff;
mod engine;
mod settings;

pub use diff::*;
pub use engine::*;
pub use settings::*;
