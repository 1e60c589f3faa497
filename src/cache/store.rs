//! Object store capability.
//!
//! The resolver needs three things from a blob store: an existence check,
//! a time-limited read URL, and an upload. Backends implement
//! [`ObjectStore`] so the cache can be exercised without a network.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Content type recorded on uploaded tracks.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Errors raised by an object store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store rejected or failed the request.
    #[error("store request failed: {0}")]
    Request(String),

    /// An access URL could not be signed.
    #[error("could not sign access URL: {0}")]
    Presign(String),

    /// The local artifact could not be read.
    #[error("could not read artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Minimal keyed blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns true if an object exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Issues a read URL for `key` valid for `expires_in`.
    async fn presigned_get_url(&self, key: &str, expires_in: Duration)
        -> Result<String, StoreError>;

    /// Uploads the file at `path` to `key`, replacing any existing object.
    async fn put_file(&self, key: &str, path: &Path, content_type: &str)
        -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
