//! Error types for the certificate store.

use std::time::Duration;

/// Errors that can occur when working with the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Key absent where the operation requires it to exist
    #[error("not found: {key}")]
    NotFound { key: String },

    /// Unlock called on a lock that is not held
    #[error("lock '{name}' is not held")]
    NotLocked { name: String },

    /// Lock wait deadline exhausted while another holder kept the lock
    #[error("lock '{name}' not acquired within {waited:?}")]
    LockTimeout { name: String, waited: Duration },

    /// Malformed key (empty, or unusable as an object path)
    #[error("invalid key: {key:?}")]
    InvalidKey { key: String },

    /// Object storage error
    #[error("object storage error: {0}")]
    Backend(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Lock record (de)serialization error
    #[error("lock record error: {0}")]
    LockRecord(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this error means "the resource is absent" rather than
    /// "the operation failed". Callers deciding retry policy need the
    /// distinction for every operation that can mean either.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. }
                | StoreError::Backend(object_store::Error::NotFound { .. })
        )
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
