//! # repodb
//!
//! JSON collections stored as files in a GitHub repository.
//!
//! Each collection is a `<name>.json` file at the root of one repository,
//! holding a JSON array of records. A [`CollectionStore`] discovers the
//! collections on start-up, and each [`Collection`] pushes its records back
//! as a whole file, guarded by the revision (blob SHA) it last saw.
//!
//! ```ignore
//! use repodb::{connect, GithubOptions};
//! use serde_json::json;
//!
//! let options = GithubOptions::new(token, "octocat", "school").with_branch("main");
//! let mut db = connect(options).await?;
//!
//! let students = db.add_collection("students").await?;
//! students.push(json!({ "name": "Bob", "age": 17 }));
//! students.write(Some("add Bob")).await?;
//!
//! students.retain(|s| s["age"] != 17);
//! students.write(None).await?;
//! ```
//!
//! The core only talks to a [`RemoteFileStore`]; [`GithubStore`] is the
//! production backend and [`InMemoryRemoteStore`] serves tests.

mod codec;
mod collection;
mod error;
mod naming;
mod store;

pub use codec::EMPTY_COLLECTION;
pub use collection::{Collection, CONFLICT_RETRIES};
pub use error::{Error, Operation, Result};
pub use naming::{collection_name, collection_path};
pub use store::CollectionStore;

pub use repodb_github::{GithubOptions, GithubOptionsPatch, GithubStore, DEFAULT_BRANCH};
pub use repodb_remote_store::memory::InMemoryRemoteStore;
pub use repodb_remote_store::{ErrorKind, RemoteFile, RemoteFileStore, Revision, StoreError};

/// Open the collection store for the repository named in `options`.
///
/// The options are validated first; a missing repository is created.
pub async fn connect(options: GithubOptions) -> Result<CollectionStore<GithubStore>> {
    tracing::debug!(?options, "connecting");
    let remote = GithubStore::new(options)?;
    CollectionStore::initiate(remote).await
}
