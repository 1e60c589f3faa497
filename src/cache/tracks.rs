//! Track cache on top of an object store.
//!
//! The existence of `music/{id}.mp3` in the store is the cache entry.
//! Access URLs are never cached; a fresh one is issued per request.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DEFAULT_URL_TTL_SECS;
use crate::error::{ResolverError, Result};
use crate::types::TrackId;

use super::store::{ObjectStore, AUDIO_CONTENT_TYPE};

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// The track is stored; carries a fresh access URL.
    Hit(String),
    /// The track is not stored, or the store could not be checked.
    Miss,
}

/// Track cache keyed by [`TrackId`].
#[derive(Clone)]
pub struct ObjectCache {
    store: Arc<dyn ObjectStore>,
    url_ttl: Duration,
}

impl ObjectCache {
    /// Creates a cache issuing URLs valid for one hour.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_url_ttl(store, Duration::from_secs(DEFAULT_URL_TTL_SECS))
    }

    /// Creates a cache issuing URLs valid for `url_ttl`.
    pub fn with_url_ttl(store: Arc<dyn ObjectStore>, url_ttl: Duration) -> Self {
        Self { store, url_ttl }
    }

    /// Returns the access URL lifetime.
    pub fn url_ttl(&self) -> Duration {
        self.url_ttl
    }

    /// Looks up a track.
    ///
    /// Store errors are logged and reported as [`CacheLookup::Miss`]: an
    /// unreachable store costs an extra fetch rather than failing the request.
    pub async fn lookup(&self, track_id: &TrackId) -> CacheLookup {
        let key = track_id.object_key();

        match self.store.exists(&key).await {
            Ok(true) => {}
            Ok(false) => return CacheLookup::Miss,
            Err(e) => {
                tracing::warn!(
                    track_id = %track_id,
                    store = self.store.name(),
                    error = %e,
                    "cache check failed, treating as miss"
                );
                return CacheLookup::Miss;
            }
        }

        match self.store.presigned_get_url(&key, self.url_ttl).await {
            Ok(url) => CacheLookup::Hit(url),
            Err(e) => {
                tracing::warn!(
                    track_id = %track_id,
                    store = self.store.name(),
                    error = %e,
                    "could not issue URL for cached track, treating as miss"
                );
                CacheLookup::Miss
            }
        }
    }

    /// Uploads a fetched artifact and returns a fresh access URL for it.
    ///
    /// Overwrites any existing object under the same key.
    pub async fn put(&self, track_id: &TrackId, artifact: &Path) -> Result<String> {
        let key = track_id.object_key();

        self.store
            .put_file(&key, artifact, AUDIO_CONTENT_TYPE)
            .await
            .map_err(ResolverError::upload_failed)?;

        tracing::info!(track_id = %track_id, key = %key, "uploaded track");

        self.store
            .presigned_get_url(&key, self.url_ttl)
            .await
            .map_err(ResolverError::upload_failed)
    }
}
