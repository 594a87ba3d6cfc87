//! Error types for collection operations.

use repodb_remote_store::{ErrorKind, StoreError};

/// The remote call a collection operation was making when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CheckRepository,
    CreateRepository,
    DeleteRepository,
    ListFiles,
    ReadFile,
    ReadRevision,
    CreateFile,
    UpdateFile,
    DeleteFile,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::CheckRepository => "check repository",
            Operation::CreateRepository => "create repository",
            Operation::DeleteRepository => "delete repository",
            Operation::ListFiles => "list files",
            Operation::ReadFile => "read file",
            Operation::ReadRevision => "read revision",
            Operation::CreateFile => "create file",
            Operation::UpdateFile => "update file",
            Operation::DeleteFile => "delete file",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by collections and the collection store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A remote call failed.
    #[error("cannot {operation} [{path}]: {source}")]
    Store {
        operation: Operation,
        path: String,
        source: StoreError,
    },

    /// The revision was still stale after the conflict retry.
    #[error("cannot {operation} [{path}]: revision conflict after {attempts} attempts")]
    Conflict {
        operation: Operation,
        path: String,
        attempts: usize,
    },

    /// Records could not be serialized to JSON.
    #[error("cannot serialize records of [{path}]: {source}")]
    Encode {
        path: String,
        source: serde_json::Error,
    },

    /// Remote content is not a JSON array of the expected records.
    #[error("cannot parse [{path}] as a JSON array: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },

    /// The name cannot be stored as a root-level `<name>.json` file.
    #[error("invalid collection name [{name}]")]
    InvalidName { name: String },

    /// The GitHub backend could not be set up.
    #[error("cannot connect: {0}")]
    Connect(#[from] repodb_github::Error),
}

impl Error {
    pub(crate) fn store(operation: Operation, path: &str, source: StoreError) -> Self {
        Error::Store {
            operation,
            path: path.to_string(),
            source,
        }
    }

    /// Classify the failure so callers can pick a policy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Store { source, .. } => source.kind(),
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Encode { .. } | Error::Decode { .. } => ErrorKind::Transport,
            Error::InvalidName { .. } | Error::Connect(_) => ErrorKind::Configuration,
        }
    }
}

/// Result type alias for collection operations.
pub type Result<T> = std::result::Result<T, Error>;
