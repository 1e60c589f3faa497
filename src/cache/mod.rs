//! Cache module for track storage.
//!
//! Provides the object store capability, its backends, and the track
//! cache that the resolver consults before fetching.

pub mod memory;
pub mod s3;
pub mod store;
pub mod tracks;

use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};

// Re-export commonly used types
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;
pub use store::{ObjectStore, StoreError, AUDIO_CONTENT_TYPE};
pub use tracks::{CacheLookup, ObjectCache};

/// Builds the configured object store backend.
pub async fn build_store(config: &StoreConfig) -> Arc<dyn ObjectStore> {
    match config.backend {
        StoreBackend::S3 => Arc::new(S3ObjectStore::from_config(config).await),
        StoreBackend::Memory => {
            let bucket = if config.bucket.is_empty() {
                "local"
            } else {
                config.bucket.as_str()
            };
            Arc::new(MemoryObjectStore::new(bucket))
        }
    }
}
