//! tabsync - Core traits, types, and constants.
//!
//! This module provides the foundational abstractions the sync engine is built
//! on: the shared object type, the storage and notification capabilities, and
//! the error types. It has no runtime dependencies.

mod constants;
mod error;
mod traits;

pub use constants::*;
pub use error::*;
pub use traits::*;

/// The flat key-value object shared between contexts.
///
/// Keys are kept sorted, so two equal objects always serialize to the same
/// text. A key is never mapped to `null`; assigning `null` removes the key.
pub type SharedObject = serde_json::Map<String, serde_json::Value>;
