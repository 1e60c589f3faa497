//! In-process object store.
//!
//! Keeps objects in a map for local runs and tests. Issued URLs look like
//! presigned URLs but point nowhere.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::store::{ObjectStore, StoreError};

/// A stored object.
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Object store backed by a `HashMap`.
pub struct MemoryObjectStore {
    bucket: String,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    /// Creates an empty store for `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// Inserts an object directly, bypassing upload.
    pub fn insert(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.objects.lock().unwrap().insert(
            key.into(),
            StoredObject {
                bytes,
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    /// Checks if an object exists at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// Returns a copy of the object's bytes.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).map(|o| o.bytes.clone())
    }

    /// Returns the content type recorded for `key`.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.content_type.clone())
    }

    /// Returns the number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("local")
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.contains(key))
    }

    async fn presigned_get_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let signature = hex::encode(rand::random::<[u8; 16]>());
        Ok(format!(
            "https://{}.memory.local/{}?X-Expires={}&X-Signature={}",
            self.bucket,
            key,
            expires_in.as_secs(),
            signature
        ))
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let bytes = tokio::fs::read(path).await?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
