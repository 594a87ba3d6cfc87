//! # repodb-github
//!
//! GitHub backend for repodb.
//!
//! [`GithubStore`] implements [`RemoteFileStore`](repodb_remote_store::RemoteFileStore)
//! on top of the GitHub REST API: files live under the root of one
//! repository, and the blob SHA GitHub reports for each file is the
//! revision token.
//!
//! ```ignore
//! use repodb_github::{GithubOptions, GithubStore};
//! use repodb_remote_store::RemoteFileStore;
//!
//! let store = GithubStore::new(GithubOptions::new("ghp_...", "octocat", "my-db"))?;
//!
//! if !store.repository_exists().await? {
//!     store.create_repository(true).await?;
//! }
//! let paths = store.list_paths().await?;
//! ```
//!
//! Requests go through an [`HttpExecutor`], so the store can be driven by a
//! canned executor in tests. [`ReqwestExecutor`] is the production one.

pub mod error;
pub mod executor;
pub mod options;
pub mod types;

mod api;
mod store;

pub use error::Error;
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use options::{GithubOptions, GithubOptionsPatch, DEFAULT_API_BASE, DEFAULT_BRANCH};
pub use store::GithubStore;
pub use types::{HttpRequest, HttpResponse, Method};
