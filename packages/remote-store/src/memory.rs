//! In-memory remote file store.
//!
//! Behaves like a real backend for revision checks: a stale revision is a
//! conflict, a missing file is not-found. Clones share state, so a test can
//! hold one handle while the code under test holds another.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{RemoteFile, RemoteFileStore, Revision, StoreError};

/// A store call, as recorded by [`InMemoryRemoteStore::operations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    RepositoryExists,
    CreateRepository { private: bool },
    DeleteRepository,
    ListPaths,
    FileExists { path: String },
    ReadRevision { path: String },
    ReadFile { path: String },
    CreateFile { path: String },
    UpdateFile { path: String, revision: Option<Revision> },
    DeleteFile { path: String, revision: Option<Revision> },
}

#[derive(Debug)]
struct State {
    repository: bool,
    private: bool,
    files: BTreeMap<String, RemoteFile>,
    next_revision: u64,
    forced_conflicts: usize,
    operations: Vec<Operation>,
}

impl State {
    fn next_revision(&mut self) -> Revision {
        let current = self.next_revision;
        self.next_revision += 1;
        Revision::new(format!("{:016x}", current))
    }

    fn store(&mut self, path: &str, content: Bytes) -> Revision {
        let revision = self.next_revision();
        self.files.insert(
            path.to_string(),
            RemoteFile {
                content,
                revision: revision.clone(),
            },
        );
        revision
    }

    fn take_forced_conflict(&mut self) -> bool {
        if self.forced_conflicts > 0 {
            self.forced_conflicts -= 1;
            true
        } else {
            false
        }
    }

    fn check_repository(&self, path: &str) -> Result<(), StoreError> {
        if self.repository {
            Ok(())
        } else {
            Err(StoreError::not_found(path))
        }
    }
}

/// A thread-safe, in-process [`RemoteFileStore`].
///
/// # Example
///
/// ```rust
/// use repodb_remote_store::memory::InMemoryRemoteStore;
///
/// let store = InMemoryRemoteStore::new().with_file("users.json", "[]");
/// assert_eq!(&store.contents("users.json").unwrap()[..], b"[]");
/// assert!(store.revision("users.json").is_some());
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryRemoteStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryRemoteStore {
    /// Create an empty store whose repository already exists.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                repository: true,
                private: false,
                files: BTreeMap::new(),
                next_revision: 1,
                forced_conflicts: 0,
                operations: Vec::new(),
            })),
        }
    }

    /// Start with or without a repository.
    pub fn with_repository(self, exists: bool) -> Self {
        self.state.lock().unwrap().repository = exists;
        self
    }

    /// Seed a file.
    pub fn with_file(self, path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let path = path.into();
            state.store(&path, content.into());
        }
        self
    }

    /// Replace a file behind the back of any client, as a concurrent writer
    /// would. Returns the new revision.
    pub fn write_external(&self, path: &str, content: impl Into<Bytes>) -> Revision {
        self.state.lock().unwrap().store(path, content.into())
    }

    /// Make the next `count` update or delete attempts report a conflict
    /// regardless of the revision supplied.
    pub fn inject_conflicts(&self, count: usize) {
        self.state.lock().unwrap().forced_conflicts = count;
    }

    pub fn repository_present(&self) -> bool {
        self.state.lock().unwrap().repository
    }

    /// Whether the repository was created as private.
    pub fn is_private(&self) -> bool {
        self.state.lock().unwrap().private
    }

    /// Current content of a file, if present.
    pub fn contents(&self, path: &str) -> Option<Bytes> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|f| f.content.clone())
    }

    /// Current revision of a file, if present.
    pub fn revision(&self, path: &str) -> Option<Revision> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|f| f.revision.clone())
    }

    /// All calls made so far, oldest first.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Number of update attempts made against `path`.
    pub fn update_attempts(&self, path: &str) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, Operation::UpdateFile { path: p, .. } if p == path))
            .count()
    }

    /// Number of delete attempts made against `path`.
    pub fn delete_attempts(&self, path: &str) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, Operation::DeleteFile { path: p, .. } if p == path))
            .count()
    }

    pub fn clear_operations(&self) {
        self.state.lock().unwrap().operations.clear();
    }

    fn record(&self, op: Operation) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(op);
        state
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteFileStore for InMemoryRemoteStore {
    async fn repository_exists(&self) -> Result<bool, StoreError> {
        let state = self.record(Operation::RepositoryExists);
        Ok(state.repository)
    }

    async fn create_repository(&self, private: bool) -> Result<(), StoreError> {
        let mut state = self.record(Operation::CreateRepository { private });
        if state.repository {
            return Err(StoreError::Protocol {
                status: 422,
                message: "repository already exists".to_string(),
            });
        }
        state.repository = true;
        state.private = private;
        tracing::debug!(private, "created in-memory repository");
        Ok(())
    }

    async fn delete_repository(&self) -> Result<(), StoreError> {
        let mut state = self.record(Operation::DeleteRepository);
        state.check_repository("")?;
        state.repository = false;
        state.files.clear();
        Ok(())
    }

    async fn list_paths(&self) -> Result<Vec<String>, StoreError> {
        let state = self.record(Operation::ListPaths);
        if !state.repository {
            return Ok(Vec::new());
        }
        // Nested files live in directories, which a root listing does not descend into.
        Ok(state
            .files
            .keys()
            .filter(|path| !path.contains('/'))
            .cloned()
            .collect())
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StoreError> {
        let state = self.record(Operation::FileExists {
            path: path.to_string(),
        });
        Ok(state.repository && state.files.contains_key(path))
    }

    async fn read_revision(&self, path: &str) -> Result<Revision, StoreError> {
        let state = self.record(Operation::ReadRevision {
            path: path.to_string(),
        });
        state.check_repository(path)?;
        state
            .files
            .get(path)
            .map(|f| f.revision.clone())
            .ok_or_else(|| StoreError::not_found(path))
    }

    async fn read_file(&self, path: &str) -> Result<Option<RemoteFile>, StoreError> {
        let state = self.record(Operation::ReadFile {
            path: path.to_string(),
        });
        if !state.repository {
            return Ok(None);
        }
        Ok(state.files.get(path).cloned())
    }

    async fn create_file(
        &self,
        path: &str,
        content: Bytes,
        _message: Option<&str>,
    ) -> Result<Revision, StoreError> {
        let mut state = self.record(Operation::CreateFile {
            path: path.to_string(),
        });
        state.check_repository(path)?;
        if state.files.contains_key(path) {
            // Creating over an existing file without its revision is stale by definition.
            return Err(StoreError::conflict(path));
        }
        Ok(state.store(path, content))
    }

    async fn update_file(
        &self,
        path: &str,
        content: Bytes,
        revision: Option<&Revision>,
        _message: Option<&str>,
    ) -> Result<Revision, StoreError> {
        let mut state = self.record(Operation::UpdateFile {
            path: path.to_string(),
            revision: revision.cloned(),
        });
        state.check_repository(path)?;
        if state.take_forced_conflict() {
            return Err(StoreError::conflict(path));
        }
        match (state.files.get(path), revision) {
            (Some(current), Some(supplied)) if &current.revision == supplied => {}
            (Some(_), _) => return Err(StoreError::conflict(path)),
            (None, None) => {}
            (None, Some(_)) => return Err(StoreError::not_found(path)),
        }
        Ok(state.store(path, content))
    }

    async fn delete_file(
        &self,
        path: &str,
        revision: Option<&Revision>,
        _message: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut state = self.record(Operation::DeleteFile {
            path: path.to_string(),
            revision: revision.cloned(),
        });
        state.check_repository(path)?;
        if state.take_forced_conflict() {
            return Err(StoreError::conflict(path));
        }
        let current = state
            .files
            .get(path)
            .ok_or_else(|| StoreError::not_found(path))?;
        if revision != Some(&current.revision) {
            return Err(StoreError::conflict(path));
        }
        state.files.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_read() {
        let store = InMemoryRemoteStore::new();
        let rev = store
            .create_file("a.json", Bytes::from_static(b"[]"), None)
            .await
            .unwrap();

        let file = store.read_file("a.json").await.unwrap().unwrap();
        assert_eq!(file.content, Bytes::from_static(b"[]"));
        assert_eq!(file.revision, rev);
        assert!(store.file_exists("a.json").await.unwrap());
    }

    #[tokio::test]
    async fn read_nonexistent_returns_none() {
        let store = InMemoryRemoteStore::new();
        assert!(store.read_file("missing.json").await.unwrap().is_none());
        assert!(!store.file_exists("missing.json").await.unwrap());
        assert!(matches!(
            store.read_revision("missing.json").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_with_current_revision_advances() {
        let store = InMemoryRemoteStore::new().with_file("a.json", "[]");
        let before = store.revision("a.json").unwrap();

        let after = store
            .update_file("a.json", Bytes::from_static(b"[1]"), Some(&before), None)
            .await
            .unwrap();

        assert_ne!(before, after);
        assert_eq!(store.revision("a.json").unwrap(), after);
        assert_eq!(store.contents("a.json").unwrap(), Bytes::from_static(b"[1]"));
    }

    #[tokio::test]
    async fn update_with_stale_revision_conflicts() {
        let store = InMemoryRemoteStore::new().with_file("a.json", "[]");
        let stale = store.revision("a.json").unwrap();
        store.write_external("a.json", "[2]");

        let result = store
            .update_file("a.json", Bytes::from_static(b"[1]"), Some(&stale), None)
            .await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(store.contents("a.json").unwrap(), Bytes::from_static(b"[2]"));
    }

    #[tokio::test]
    async fn update_without_revision_creates_missing_file() {
        let store = InMemoryRemoteStore::new();
        store
            .update_file("a.json", Bytes::from_static(b"[]"), None, None)
            .await
            .unwrap();
        assert!(store.revision("a.json").is_some());
    }

    #[tokio::test]
    async fn injected_conflicts_are_consumed() {
        let store = InMemoryRemoteStore::new().with_file("a.json", "[]");
        let rev = store.revision("a.json").unwrap();
        store.inject_conflicts(1);

        let first = store
            .update_file("a.json", Bytes::from_static(b"[1]"), Some(&rev), None)
            .await;
        assert!(matches!(first, Err(StoreError::Conflict { .. })));

        let second = store
            .update_file("a.json", Bytes::from_static(b"[1]"), Some(&rev), None)
            .await;
        assert!(second.is_ok());
        assert_eq!(store.update_attempts("a.json"), 2);
    }

    #[tokio::test]
    async fn delete_checks_revision() {
        let store = InMemoryRemoteStore::new().with_file("a.json", "[]");
        let rev = store.revision("a.json").unwrap();

        let stale = store
            .delete_file("a.json", Some(&Revision::from("nope")), None)
            .await;
        assert!(matches!(stale, Err(StoreError::Conflict { .. })));

        store.delete_file("a.json", Some(&rev), None).await.unwrap();
        assert!(store.contents("a.json").is_none());

        let again = store.delete_file("a.json", Some(&rev), None).await;
        assert!(matches!(again, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn missing_repository_lists_nothing() {
        let store = InMemoryRemoteStore::new().with_repository(false);
        assert!(!store.repository_exists().await.unwrap());
        assert!(store.list_paths().await.unwrap().is_empty());

        store.create_repository(true).await.unwrap();
        assert!(store.repository_present());
        assert!(store.is_private());
    }

    #[tokio::test]
    async fn listing_covers_root_files_only() {
        let store = InMemoryRemoteStore::new()
            .with_file("a.json", "[]")
            .with_file("team/b.json", "[]");

        assert_eq!(store.list_paths().await.unwrap(), vec!["a.json"]);
        assert!(store.read_file("team/b.json").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_repository_drops_files() {
        let store = InMemoryRemoteStore::new().with_file("a.json", "[]");
        store.delete_repository().await.unwrap();
        assert!(!store.repository_present());
        assert!(store.contents("a.json").is_none());
    }

    #[tokio::test]
    async fn clones_share_state_and_record_operations() {
        let store = InMemoryRemoteStore::new();
        let other = store.clone();
        other
            .create_file("a.json", Bytes::from_static(b"[]"), None)
            .await
            .unwrap();
        store.list_paths().await.unwrap();

        assert_eq!(
            store.operations(),
            vec![
                Operation::CreateFile {
                    path: "a.json".to_string()
                },
                Operation::ListPaths,
            ]
        );

        store.clear_operations();
        assert!(other.operations().is_empty());
    }
}
