use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown value kind: {0}")]
    UnknownKind(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
