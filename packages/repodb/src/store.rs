//! The collection store: every collection in one remote repository.
//!
//! On [`CollectionStore::initiate`] the store reconciles with the remote:
//! each `*.json` file at the repository root becomes a collection, loaded
//! with its content and revision. Local state always follows the remote,
//! never the other way round.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use repodb_remote_store::{Bytes, RemoteFileStore};

use crate::codec;
use crate::collection::Collection;
use crate::error::{Error, Operation, Result};
use crate::naming;

/// A named set of collections sharing one remote store.
///
/// Collections are kept in discovery/creation order. They hold untyped
/// [`Value`] records; use [`CollectionStore::detach`] to work with a
/// concrete record type and [`CollectionStore::attach`] to hand it back.
///
/// # Example
///
/// ```ignore
/// use repodb::{connect, GithubOptions};
///
/// let mut db = connect(GithubOptions::new(token, "octocat", "school")).await?;
///
/// let students = db.add_collection("students").await?;
/// students.push(serde_json::json!({ "name": "Bob", "age": 17 }));
/// students.write(None).await?;
/// ```
pub struct CollectionStore<S> {
    remote: Arc<S>,
    collections: Vec<Collection>,
}

impl<S: RemoteFileStore + 'static> CollectionStore<S> {
    /// Connect to `remote` and load every collection it holds.
    ///
    /// Creates the repository (private) when it does not exist yet.
    pub async fn initiate(remote: S) -> Result<Self> {
        Self::initiate_shared(Arc::new(remote)).await
    }

    /// Like [`CollectionStore::initiate`], for a remote shared elsewhere.
    pub async fn initiate_shared(remote: Arc<S>) -> Result<Self> {
        let mut store = Self {
            remote,
            collections: Vec::new(),
        };

        let exists = store
            .remote
            .repository_exists()
            .await
            .map_err(|e| Error::store(Operation::CheckRepository, "", e))?;
        if !exists {
            store
                .remote
                .create_repository(true)
                .await
                .map_err(|e| Error::store(Operation::CreateRepository, "", e))?;
        }

        let paths = store
            .remote
            .list_paths()
            .await
            .map_err(|e| Error::store(Operation::ListFiles, "", e))?;
        for path in &paths {
            if let Some(name) = naming::collection_name(path) {
                store.add_collection(name).await?;
            }
        }

        tracing::info!(collections = store.collections.len(), "repository database started");
        Ok(store)
    }

    fn shared_remote(&self) -> Arc<dyn RemoteFileStore> {
        self.remote.clone()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.collections.iter().position(|c| c.name() == name)
    }

    /// Register the collection `name`, creating its remote file if needed.
    ///
    /// An existing remote file is pulled: records and revision come from a
    /// single read. A missing one is created holding `[]`. Registering a name
    /// twice reloads it in place.
    ///
    /// Names that are empty or contain `/` are rejected with
    /// [`Error::InvalidName`] before the remote is touched.
    pub async fn add_collection(&mut self, name: &str) -> Result<&mut Collection> {
        if !naming::is_valid_name(name) {
            return Err(Error::InvalidName {
                name: name.to_string(),
            });
        }
        let collection = load(self.shared_remote(), name).await?;
        let index = match self.position(name) {
            Some(index) => {
                self.collections[index] = collection;
                index
            }
            None => {
                self.collections.push(collection);
                self.collections.len() - 1
            }
        };
        Ok(&mut self.collections[index])
    }

    /// Delete the whole remote repository and forget every collection.
    pub async fn remove_repository(&mut self) -> Result<()> {
        self.remote
            .delete_repository()
            .await
            .map_err(|e| Error::store(Operation::DeleteRepository, "", e))?;
        self.collections.clear();
        Ok(())
    }

    /// Delete a collection's remote file and drop it from the store.
    ///
    /// Returns `Ok(false)` when no such collection is registered.
    pub async fn delete_collection(&mut self, name: &str, message: Option<&str>) -> Result<bool> {
        let Some(index) = self.position(name) else {
            return Ok(false);
        };
        self.collections[index].delete(message).await?;
        self.collections.remove(index);
        Ok(true)
    }

    /// Forget a collection locally, leaving its remote file alone.
    pub fn drop_collection(&mut self, name: &str) -> Option<Collection> {
        self.position(name).map(|index| self.collections.remove(index))
    }

    /// Take a collection out of the store with records of type `T`.
    ///
    /// The collection stays in the store if its records do not fit `T`.
    pub fn detach<T: DeserializeOwned>(&mut self, name: &str) -> Result<Option<Collection<T>>> {
        let Some(index) = self.position(name) else {
            return Ok(None);
        };
        let existing = &self.collections[index];
        let records = codec::convert_records::<Value, T>(existing.path(), existing.records())?;
        Ok(Some(self.collections.remove(index).with_records(records)))
    }

    /// Put a typed collection (back) into the store, replacing any
    /// collection of the same name.
    pub fn attach<T: Serialize>(&mut self, collection: Collection<T>) -> Result<()> {
        let collection = collection.into_untyped()?;
        match self.position(collection.name()) {
            Some(index) => self.collections[index] = collection,
            None => self.collections.push(collection),
        }
        Ok(())
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.position(name).map(|index| &self.collections[index])
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut Collection> {
        self.position(name).map(|index| &mut self.collections[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Collection names in discovery/creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|c| c.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// The remote store, e.g. to adjust its options.
    pub fn remote(&self) -> &S {
        &self.remote
    }
}

impl<S> std::fmt::Debug for CollectionStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStore")
            .field("collections", &self.collections)
            .finish_non_exhaustive()
    }
}

/// Load the collection `name` from `remote`, creating an empty remote file
/// when there is none.
async fn load(remote: Arc<dyn RemoteFileStore>, name: &str) -> Result<Collection> {
    let path = naming::collection_path(name);
    let file = remote
        .read_file(&path)
        .await
        .map_err(|e| Error::store(Operation::ReadFile, &path, e))?;

    match file {
        Some(file) => {
            let records = codec::decode_records(&path, &file.content)?;
            tracing::debug!(path = %path, records = records.len(), revision = %file.revision, "pulled collection");
            Ok(Collection::from_parts(
                name,
                remote,
                records,
                Some(file.revision),
            ))
        }
        None => {
            let revision = remote
                .create_file(&path, Bytes::from_static(codec::EMPTY_COLLECTION), None)
                .await
                .map_err(|e| Error::store(Operation::CreateFile, &path, e))?;
            tracing::debug!(path = %path, revision = %revision, "created collection");
            Ok(Collection::from_parts(name, remote, Vec::new(), Some(revision)))
        }
    }
}
