//! A collection: an ordered list of records backed by one remote file.
//!
//! The records are plain memory. Mutate them freely through the `Vec` API
//! (the collection derefs to `Vec<T>`), then call [`Collection::write`] to
//! push the whole list to the remote file. The collection remembers the
//! revision it last saw; the remote store refuses a write or delete that
//! names an older one.
//!
//! # Conflict recovery
//!
//! A refused write or delete is retried [`CONFLICT_RETRIES`] time(s) after
//! fetching the file's current revision. Local records win: nothing is
//! merged, the retry simply replaces whatever changed remotely. A conflict
//! that survives the retry is returned as [`Error::Conflict`].

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use repodb_remote_store::{RemoteFileStore, Revision, StoreError};

use crate::codec;
use crate::error::{Error, Operation, Result};
use crate::naming;

/// How many times a conflicting write or delete is retried.
pub const CONFLICT_RETRIES: usize = 1;

pub struct Collection<T = Value> {
    name: String,
    path: String,
    revision: Option<Revision>,
    records: Vec<T>,
    remote: Arc<dyn RemoteFileStore>,
}

impl<T> Collection<T> {
    pub(crate) fn from_parts(
        name: &str,
        remote: Arc<dyn RemoteFileStore>,
        records: Vec<T>,
        revision: Option<Revision>,
    ) -> Self {
        Self {
            name: name.to_string(),
            path: naming::collection_path(name),
            revision,
            records,
            remote,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remote path of the backing file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Revision of the remote file as of the last sync, `None` after delete.
    pub fn revision(&self) -> Option<&Revision> {
        self.revision.as_ref()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut Vec<T> {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    pub(crate) fn with_records<U>(self, records: Vec<U>) -> Collection<U> {
        Collection {
            name: self.name,
            path: self.path,
            revision: self.revision,
            records,
            remote: self.remote,
        }
    }

    /// Decide what to do with a failed attempt: `Ok` carries the revision to
    /// retry with.
    async fn recover(
        &self,
        operation: Operation,
        attempt: usize,
        error: StoreError,
    ) -> Result<Revision> {
        if !error.is_conflict() {
            return Err(Error::store(operation, &self.path, error));
        }
        if attempt > CONFLICT_RETRIES {
            return Err(Error::Conflict {
                operation,
                path: self.path.clone(),
                attempts: attempt,
            });
        }
        tracing::warn!(path = %self.path, %operation, attempt, "revision conflict, refetching revision");
        self.remote
            .read_revision(&self.path)
            .await
            .map_err(|e| Error::store(Operation::ReadRevision, &self.path, e))
    }

    /// Remove the remote file, then empty the records and forget the
    /// revision.
    ///
    /// The collection stays registered in its
    /// [`CollectionStore`](crate::CollectionStore); use
    /// [`CollectionStore::delete_collection`](crate::CollectionStore::delete_collection)
    /// to drop it as well.
    pub async fn delete(&mut self, message: Option<&str>) -> Result<()> {
        let mut revision = self.revision.clone();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .remote
                .delete_file(&self.path, revision.as_ref(), message)
                .await;
            match result {
                Ok(()) => {
                    tracing::info!(path = %self.path, attempt, "deleted collection");
                    self.records.clear();
                    self.revision = None;
                    return Ok(());
                }
                Err(error) => {
                    revision = Some(self.recover(Operation::DeleteFile, attempt, error).await?);
                }
            }
        }
    }
}

impl<T: Serialize> Collection<T> {
    /// Push the records to the remote file.
    ///
    /// On success the collection adopts the new revision; the records are
    /// left exactly as they were.
    pub async fn write(&mut self, message: Option<&str>) -> Result<()> {
        let content = codec::encode_records(&self.path, &self.records)?;
        tracing::debug!(path = %self.path, bytes = content.len(), "writing collection");

        let mut revision = self.revision.clone();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .remote
                .update_file(&self.path, content.clone(), revision.as_ref(), message)
                .await;
            match result {
                Ok(new_revision) => {
                    tracing::info!(path = %self.path, revision = %new_revision, attempt, "updated collection");
                    self.revision = Some(new_revision);
                    return Ok(());
                }
                Err(error) => {
                    revision = Some(self.recover(Operation::UpdateFile, attempt, error).await?);
                }
            }
        }
    }

    /// Drop the record type, keeping name, revision and remote.
    pub fn into_untyped(self) -> Result<Collection<Value>> {
        let records = codec::convert_records(&self.path, &self.records)?;
        Ok(self.with_records(records))
    }
}

impl Collection<Value> {
    /// Give the records a concrete type.
    ///
    /// Fails with [`Error::Decode`] if any record does not deserialize as `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<Collection<T>> {
        let records = codec::convert_records(&self.path, &self.records)?;
        Ok(self.with_records(records))
    }
}

impl<T> Deref for Collection<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.records
    }
}

impl<T> DerefMut for Collection<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.records
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("revision", &self.revision)
            .field("records", &self.records)
            .finish()
    }
}
