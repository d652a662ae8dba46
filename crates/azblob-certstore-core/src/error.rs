//! Error types for the certificate storage library.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the certificate storage library.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(#[from] LockError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the requested key does not exist.
    ///
    /// This is the only condition callers are expected to branch on: a
    /// certificate manager treats it as "nothing stored yet".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Storage(StorageError::NotFound(_)))
    }

    /// Whether this error means another holder owns the lease.
    pub fn is_lock_conflict(&self) -> bool {
        matches!(self, Error::Lock(LockError::Conflict { .. }))
    }
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Storage backend error (network, auth, quota, service failure)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Key cannot be addressed in the object store
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Operation exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Lease lock errors
#[derive(Error, Debug)]
pub enum LockError {
    /// Another holder currently owns the lease
    #[error("Lease on {target} is held by another holder")]
    Conflict { target: String },

    /// No lease is held on the target under this holder token
    #[error("No lease held on {target} by this holder")]
    NotHeld { target: String },

    /// Transport, auth or service failure while talking to the lease API
    #[error("Lease request failed: {0}")]
    Transport(String),
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
