//! Error types for CRDT operations

use crate::crdt::CrdtType;
use thiserror::Error;

/// CRDT operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrdtError {
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("CRDT not found: {id}")]
    CrdtNotFound { id: String },

    #[error("CRDT already exists: {id}")]
    AlreadyExists { id: String },

    #[error("Unsupported CRDT type: {0}")]
    UnsupportedType(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: CrdtType, actual: CrdtType },

    #[error("Identifier mismatch: cannot merge {left} with {right}")]
    IdMismatch { left: String, right: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CrdtError {
    /// Whether the failure is caused by the caller rather than by replica state.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, CrdtError::SerializationError(_) | CrdtError::Config(_))
    }
}

impl From<serde_json::Error> for CrdtError {
    fn from(err: serde_json::Error) -> Self {
        CrdtError::SerializationError(err.to_string())
    }
}

/// Result type for CRDT operations
pub type Result<T> = std::result::Result<T, CrdtError>;
