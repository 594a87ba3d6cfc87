//! The remote file store trait.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Opaque token naming one version of a remote file.
///
/// A store hands one out on every successful create, update and read, and
/// demands it back before it will replace or remove the file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Revision {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Revision {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// A file's content together with the revision it was read at.
///
/// Both halves come from the same read, so the revision always describes
/// exactly these bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: Bytes,
    pub revision: Revision,
}

/// Path-addressed blob storage with optimistic concurrency.
///
/// Paths are plain strings relative to the repository root. Content is raw
/// bytes; any transport encoding is the implementation's business.
///
/// Not-found is reported as a value wherever the question allows it
/// (`file_exists`, `read_file`, `list_paths`), and as
/// [`StoreError::NotFound`] where an answer is required (`read_revision`,
/// `delete_file`).
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Arc<dyn RemoteFileStore>`.
#[async_trait]
pub trait RemoteFileStore: Send + Sync {
    /// Whether the backing repository exists.
    async fn repository_exists(&self) -> Result<bool, StoreError>;

    /// Create the backing repository.
    async fn create_repository(&self, private: bool) -> Result<(), StoreError>;

    /// Delete the backing repository and everything in it.
    async fn delete_repository(&self) -> Result<(), StoreError>;

    /// Paths at the repository root. Empty when the repository has no files.
    async fn list_paths(&self) -> Result<Vec<String>, StoreError>;

    async fn file_exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Current revision of the file at `path`.
    async fn read_revision(&self, path: &str) -> Result<Revision, StoreError>;

    /// Content and revision of the file at `path`, or `None` if absent.
    async fn read_file(&self, path: &str) -> Result<Option<RemoteFile>, StoreError>;

    /// Create a new file and return its first revision.
    async fn create_file(
        &self,
        path: &str,
        content: Bytes,
        message: Option<&str>,
    ) -> Result<Revision, StoreError>;

    /// Replace the file at `path`, proving the caller saw `revision`.
    ///
    /// Returns [`StoreError::Conflict`] when `revision` is stale.
    async fn update_file(
        &self,
        path: &str,
        content: Bytes,
        revision: Option<&Revision>,
        message: Option<&str>,
    ) -> Result<Revision, StoreError>;

    /// Remove the file at `path`, proving the caller saw `revision`.
    ///
    /// Returns [`StoreError::Conflict`] when `revision` is stale.
    async fn delete_file(
        &self,
        path: &str,
        revision: Option<&Revision>,
        message: Option<&str>,
    ) -> Result<(), StoreError>;
}

macro_rules! forward_remote_file_store {
    ($($target:tt)*) => {
        #[async_trait]
        impl<T: RemoteFileStore + ?Sized> RemoteFileStore for $($target)* {
            async fn repository_exists(&self) -> Result<bool, StoreError> {
                (**self).repository_exists().await
            }

            async fn create_repository(&self, private: bool) -> Result<(), StoreError> {
                (**self).create_repository(private).await
            }

            async fn delete_repository(&self) -> Result<(), StoreError> {
                (**self).delete_repository().await
            }

            async fn list_paths(&self) -> Result<Vec<String>, StoreError> {
                (**self).list_paths().await
            }

            async fn file_exists(&self, path: &str) -> Result<bool, StoreError> {
                (**self).file_exists(path).await
            }

            async fn read_revision(&self, path: &str) -> Result<Revision, StoreError> {
                (**self).read_revision(path).await
            }

            async fn read_file(&self, path: &str) -> Result<Option<RemoteFile>, StoreError> {
                (**self).read_file(path).await
            }

            async fn create_file(
                &self,
                path: &str,
                content: Bytes,
                message: Option<&str>,
            ) -> Result<Revision, StoreError> {
                (**self).create_file(path, content, message).await
            }

            async fn update_file(
                &self,
                path: &str,
                content: Bytes,
                revision: Option<&Revision>,
                message: Option<&str>,
            ) -> Result<Revision, StoreError> {
                (**self).update_file(path, content, revision, message).await
            }

            async fn delete_file(
                &self,
                path: &str,
                revision: Option<&Revision>,
                message: Option<&str>,
            ) -> Result<(), StoreError> {
                (**self).delete_file(path, revision, message).await
            }
        }
    };
}

// Blanket implementations for references and smart pointers
forward_remote_file_store!(&T);
forward_remote_file_store!(Box<T>);
forward_remote_file_store!(Arc<T>);
