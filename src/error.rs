//! # FieldSync Error Handling
//!
//! Unified error type for the resolver, the mapping set manager and the
//! settings form. External collaborators fail with [`TransportError`], the
//! confirmation gate with [`GateError`]; both convert into [`FieldSyncError`].

use crate::config::ConfigError;
use thiserror::Error;

/// Failure reported by an external collaborator (schema lookup, mapping or
/// settings persistence).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The requested object or entity is unknown to the collaborator
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The collaborator could not be reached or refused the call
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The collaborator returned data that could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<std::io::Error> for TransportError {
    fn from(error: std::io::Error) -> Self {
        TransportError::RequestFailed(error.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(error: serde_json::Error) -> Self {
        TransportError::Malformed(error.to_string())
    }
}

/// Errors raised by the confirmation gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// A request is already outstanding on this gate
    #[error("Confirmation already pending: {message}")]
    Busy { message: String },

    /// The gate was dropped before the request was settled
    #[error("Confirmation request {request_id} abandoned")]
    Abandoned { request_id: String },

    /// No decision arrived within the configured timeout
    #[error("Confirmation request {request_id} timed out after {timeout_ms} ms")]
    TimedOut { request_id: String, timeout_ms: u64 },
}

/// Unified error type for fieldsync operations.
#[derive(Error, Debug)]
pub enum FieldSyncError {
    // ========== Path Resolution Errors ==========
    /// The field id is not among the candidates of the given level
    #[error("Invalid selection at level {level}: {reason}")]
    InvalidSelection { level: usize, reason: String },

    /// Confirm was requested before a terminal field was chosen
    #[error("Incomplete selection: no terminal field chosen (depth {depth})")]
    IncompleteSelection { depth: usize },

    /// A reference field points to several objects and no target was named
    #[error("Ambiguous reference {field_id}: choose one of {targets:?}")]
    AmbiguousReference { field_id: String, targets: Vec<String> },

    /// A dotted path string is not structurally well formed
    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    // ========== Mapping Set Errors ==========
    /// No mapping record carries the given ident
    #[error("Mapping record not found: {ident}")]
    RecordNotFound { ident: u64 },

    /// The manager has not completed a successful initialize
    #[error("Mapping set not loaded")]
    NotLoaded,

    /// The operation needs a bound local object and none is bound
    #[error("No local object bound")]
    NoLocalObject,

    /// A local object is already bound; changing it goes through a confirmed rebind
    #[error("Local object already bound to '{0}'")]
    AlreadyBound(String),

    /// The configured authorization does not allow mutations
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Records or settings values failed validation before save
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A settings field name is unknown
    #[error("Invalid field: {0}")]
    InvalidField(String),

    // ========== Wrapped Errors ==========
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Confirmation error: {0}")]
    Gate(#[from] GateError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for fieldsync operations
pub type FieldSyncResult<T> = Result<T, FieldSyncError>;

impl FieldSyncError {
    /// Create an invalid selection error with context
    pub fn invalid_selection<S: Into<String>>(level: usize, reason: S) -> Self {
        Self::InvalidSelection {
            level,
            reason: reason.into(),
        }
    }

    /// Create an invalid path error with context
    pub fn invalid_path<P: Into<String>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from an external collaborator and may succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(TransportError::RequestFailed(_)))
    }
}
