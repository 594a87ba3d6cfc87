//! Remote file store: the narrow waist between repodb collections and
//! whatever actually holds the files.
//!
//! Everything at this level is path-addressed bytes plus a revision token.
//! No JSON, no collection semantics, no transport encoding. A store only has
//! to answer "what is at this path, and at which revision" and refuse writes
//! that name a stale revision.
//!
//! Use this layer for:
//! - Plugging a new backend (GitHub, a local git checkout, an object store)
//!   under the repodb core
//! - Testing the core against [`memory::InMemoryRemoteStore`] without network
//!
//! # Example
//!
//! ```rust
//! use repodb_remote_store::{RemoteFileStore, Revision, StoreError};
//! use bytes::Bytes;
//!
//! async fn replace(
//!     store: &dyn RemoteFileStore,
//!     path: &str,
//!     data: &[u8],
//!     known: &Revision,
//! ) -> Result<Revision, StoreError> {
//!     store
//!         .update_file(path, Bytes::copy_from_slice(data), Some(known), None)
//!         .await
//! }
//! ```

pub use bytes::Bytes;

mod error;
pub mod memory;
mod traits;

pub use error::{ErrorKind, StoreError};
pub use traits::{RemoteFile, RemoteFileStore, Revision};
