//! Error types for remote file stores.
//!
//! Errors here describe what the backend reported, not what the caller was
//! trying to do. The collection layer wraps them with operation context.

use thiserror::Error;

/// Coarse classification of a failure, shared by every repodb layer.
///
/// Callers decide policy on this (retry more, abort, log) rather than on the
/// concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The repository or file is unreachable or the credentials are refused.
    Configuration,
    /// The file or repository does not exist.
    NotFound,
    /// The supplied revision no longer matches the remote file.
    Conflict,
    /// Any other transport or protocol failure.
    Transport,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Transport => "transport",
        };
        f.write_str(name)
    }
}

/// Errors reported by a [`RemoteFileStore`](crate::RemoteFileStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nothing exists at the path.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// The revision supplied with an update or delete is stale.
    #[error("revision conflict on {path}")]
    Conflict { path: String },

    /// The backend refused the credentials or the target is not accessible.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The backend answered with an unexpected status.
    #[error("protocol error: status {status} - {message}")]
    Protocol { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered but the payload could not be understood.
    #[error("cannot decode response for {path}: {message}")]
    Decode { path: String, message: String },
}

impl StoreError {
    pub fn not_found(path: impl Into<String>) -> Self {
        StoreError::NotFound { path: path.into() }
    }

    pub fn conflict(path: impl Into<String>) -> Self {
        StoreError::Conflict { path: path.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Unauthorized { .. } => ErrorKind::Configuration,
            StoreError::Protocol { .. }
            | StoreError::Transport(_)
            | StoreError::Decode { .. } => ErrorKind::Transport,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
