//! Encrypted, versioned paste storage and the HTTP handlers built on it.
//!
//! Every paste version is sealed by the process-wide codec before it reaches
//! SQLite. Keys are either generated (8 hex chars) or supplied by the caller,
//! in which case the first write creates the paste.

pub mod codec;
pub mod keys;
pub mod pages;
pub mod routes;
pub mod store;

pub use codec::{CodecKey, KeySource, PasteCodec};
pub use store::{LatestVersion, PasteStore};

use crate::error::PasteError;

/// Run a synchronous store call on the blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, PasteError>
where
    F: FnOnce() -> Result<T, PasteError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PasteError::StorageUnavailable(format!("Task join error: {}", e)))?
}
