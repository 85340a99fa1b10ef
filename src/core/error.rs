//! Error types for tabsync.

use thiserror::Error;

/// Errors reported by a [`Store`](super::Store) adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage cannot be reached right now.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The blob does not fit in the backing storage.
    #[error("quota exceeded: {size} bytes, limit {limit}")]
    QuotaExceeded {
        /// Size of the rejected entry.
        size: usize,
        /// Largest entry the backend accepts.
        limit: usize,
    },

    /// The stored bytes are not valid text.
    #[error("stored value is not valid utf-8")]
    InvalidEncoding,

    /// I/O error from a file-backed store.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from one sync tick.
///
/// None of these are fatal: the poll loop logs them and tries again on the
/// next tick.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading or writing the slot failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The persisted blob is not valid JSON.
    #[error("malformed persisted data: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The persisted blob is valid JSON but not an object.
    #[error("persisted data is not an object (found {found})")]
    NotAnObject {
        /// JSON type of the value that was found.
        found: &'static str,
    },

    /// The in-memory object could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Invalid configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The slot name is empty or contains a reserved character.
    #[error("invalid slot name {0:?}")]
    InvalidName(String),

    /// The poll delay must be non-zero.
    #[error("poll delay must be greater than zero")]
    ZeroDelay,

    /// The scoping path must be absolute.
    #[error("invalid path {0:?}: must start with '/'")]
    InvalidPath(String),

    /// Options text could not be parsed.
    #[error("invalid options: {0}")]
    Parse(String),
}

/// Top-level tabsync errors.
#[derive(Debug, Error)]
pub enum TabsyncError {
    /// Sync error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Name of a JSON value's type, for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::QuotaExceeded { size: 5000, limit: 4096 };
        assert_eq!(err.to_string(), "quota exceeded: 5000 bytes, limit 4096");

        let err = SyncError::NotAnObject { found: "array" };
        assert_eq!(err.to_string(), "persisted data is not an object (found array)");

        let err = ConfigError::InvalidName("a:b".into());
        assert_eq!(err.to_string(), "invalid slot name \"a:b\"");
    }

    #[test]
    fn test_error_conversions() {
        let store = StoreError::Unavailable("offline".into());
        let sync: SyncError = store.into();
        assert!(matches!(sync, SyncError::Store(StoreError::Unavailable(_))));

        let top: TabsyncError = ConfigError::ZeroDelay.into();
        assert!(matches!(top, TabsyncError::Config(ConfigError::ZeroDelay)));
    }

    #[test]
    fn test_json_type_name() {
        assert_eq!(json_type_name(&serde_json::json!([1])), "array");
        assert_eq!(json_type_name(&serde_json::json!("x")), "string");
        assert_eq!(json_type_name(&serde_json::json!({})), "object");
    }
}
