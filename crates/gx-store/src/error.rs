use std::path::PathBuf;

use crate::factory::Scope;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Keys must be non-empty strings.
    #[error("key must not be empty")]
    EmptyKey,

    /// The value could not be turned into its persisted representation.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend refused a write because it would exceed its quota.
    #[error("quota exceeded writing {key}: {required} bytes required, {quota} allowed")]
    QuotaExceeded {
        key: String,
        required: usize,
        quota: usize,
    },

    /// Stored data failed to parse. Never returned from reads; those log it
    /// and report the entry as absent.
    #[error("corrupt entry {key}: {reason}")]
    CorruptEntry { key: String, reason: String },

    /// A persisted namespace file exists but cannot be loaded.
    #[error("corrupt namespace file {path}: {reason}")]
    CorruptNamespace { path: PathBuf, reason: String },

    /// No backend could be provided for the requested scope.
    #[error("{scope} storage is unavailable (tried: {})", .tried.join(", "))]
    Unavailable { scope: Scope, tried: Vec<String> },

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-internal failure (e.g. a poisoned lock).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
