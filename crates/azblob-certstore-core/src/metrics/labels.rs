//! Label types for Prometheus metrics.
//!
//! This module defines the label types used for metrics dimensions,
//! following the prometheus-client crate patterns.

use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use std::fmt::Write;

use crate::error::{LockError, StorageError};

/// Labels for storage operation metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StorageLabels {
    pub backend: String,
    pub operation: String,
}

impl StorageLabels {
    pub fn new(backend: impl Into<String>, operation: StorageOperation) -> Self {
        Self {
            backend: backend.into(),
            operation: operation.as_str().to_string(),
        }
    }
}

/// Labels for storage bytes metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StorageBytesLabels {
    pub backend: String,
}

impl StorageBytesLabels {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
        }
    }
}

/// Labels for storage error metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StorageErrorLabels {
    pub backend: String,
    pub error_type: String,
}

impl StorageErrorLabels {
    pub fn new(backend: impl Into<String>, error_type: ErrorType) -> Self {
        Self {
            backend: backend.into(),
            error_type: error_type.as_str().to_string(),
        }
    }
}

/// Labels for lock attempt metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LockLabels {
    pub backend: String,
    pub action: String,
    pub outcome: String,
}

impl LockLabels {
    pub fn new(backend: impl Into<String>, action: LockAction, outcome: LockOutcome) -> Self {
        Self {
            backend: backend.into(),
            action: action.as_str().to_string(),
            outcome: outcome.as_str().to_string(),
        }
    }
}

/// Error type classification for metrics.
///
/// - not_found: key absent
/// - invalid_key: key not representable as a blob name
/// - timeout: operation deadline exceeded
/// - storage_io: backend I/O errors
/// - lock_conflict: lease held by another holder
/// - lock_not_held: lease not held by this instance
/// - config: configuration rejected
/// - unknown: unclassified errors
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ErrorType {
    NotFound,
    InvalidKey,
    Timeout,
    StorageIo,
    LockConflict,
    LockNotHeld,
    Config,
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::NotFound => "not_found",
            ErrorType::InvalidKey => "invalid_key",
            ErrorType::Timeout => "timeout",
            ErrorType::StorageIo => "storage_io",
            ErrorType::LockConflict => "lock_conflict",
            ErrorType::LockNotHeld => "lock_not_held",
            ErrorType::Config => "config",
            ErrorType::Unknown => "unknown",
        }
    }

    /// Classify an error into an ErrorType.
    pub fn from_error(error: &crate::Error) -> Self {
        match error {
            crate::Error::Storage(storage_err) => Self::classify_storage_error(storage_err),
            crate::Error::Lock(lock_err) => Self::classify_lock_error(lock_err),
            crate::Error::Config(_) => ErrorType::Config,
            crate::Error::Io(_) => ErrorType::StorageIo,
            crate::Error::Serialization(_) => ErrorType::Unknown,
        }
    }

    fn classify_storage_error(error: &StorageError) -> Self {
        match error {
            StorageError::NotFound(_) => ErrorType::NotFound,
            StorageError::InvalidKey(_) => ErrorType::InvalidKey,
            StorageError::Timeout(_) => ErrorType::Timeout,
            StorageError::Backend(msg) => {
                if msg.to_lowercase().contains("timeout") {
                    ErrorType::Timeout
                } else {
                    ErrorType::StorageIo
                }
            }
        }
    }

    fn classify_lock_error(error: &LockError) -> Self {
        match error {
            LockError::Conflict { .. } => ErrorType::LockConflict,
            LockError::NotHeld { .. } => ErrorType::LockNotHeld,
            LockError::Transport(_) => ErrorType::StorageIo,
        }
    }
}

impl EncodeLabelValue for ErrorType {
    fn encode(
        &self,
        encoder: &mut prometheus_client::encoding::LabelValueEncoder,
    ) -> std::result::Result<(), std::fmt::Error> {
        encoder.write_str(self.as_str())
    }
}

/// Storage operation type for latency metrics.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum StorageOperation {
    Store,
    Load,
    Delete,
    Exists,
    List,
    Stat,
}

impl StorageOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageOperation::Store => "store",
            StorageOperation::Load => "load",
            StorageOperation::Delete => "delete",
            StorageOperation::Exists => "exists",
            StorageOperation::List => "list",
            StorageOperation::Stat => "stat",
        }
    }
}

/// Lock call being measured.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum LockAction {
    Lock,
    Unlock,
}

impl LockAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockAction::Lock => "lock",
            LockAction::Unlock => "unlock",
        }
    }
}

/// Result of a lock call.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum LockOutcome {
    Success,
    Conflict,
    NotHeld,
    Failure,
}

impl LockOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockOutcome::Success => "success",
            LockOutcome::Conflict => "conflict",
            LockOutcome::NotHeld => "not_held",
            LockOutcome::Failure => "failure",
        }
    }

    pub fn from_result(result: &crate::Result<()>) -> Self {
        match result {
            Ok(()) => LockOutcome::Success,
            Err(crate::Error::Lock(LockError::Conflict { .. })) => LockOutcome::Conflict,
            Err(crate::Error::Lock(LockError::NotHeld { .. })) => LockOutcome::NotHeld,
            Err(_) => LockOutcome::Failure,
        }
    }
}
