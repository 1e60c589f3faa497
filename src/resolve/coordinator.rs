//! Resolution coordinator.
//!
//! Drives one request through validate -> cache lookup -> (miss) fetch ->
//! upload -> URL. Nothing is retried: a failed fetch or upload is reported
//! once and the caller decides whether to ask again.

use std::sync::Arc;

use crate::cache::{CacheLookup, ObjectCache, ObjectStore};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::fetch::{FetchExecutor, Fetcher};
use crate::types::{Resolution, TrackId};

use super::inflight::InFlight;

/// Resolves track IDs to access URLs.
pub struct ResolutionCoordinator {
    cache: ObjectCache,
    executor: FetchExecutor,
    inflight: Option<InFlight>,
}

impl ResolutionCoordinator {
    /// Creates a coordinator. With `dedupe_fetches`, concurrent misses for
    /// the same track share one fetch and upload.
    pub fn new(cache: ObjectCache, executor: FetchExecutor, dedupe_fetches: bool) -> Self {
        Self {
            cache,
            executor,
            inflight: dedupe_fetches.then(InFlight::new),
        }
    }

    /// Wires a coordinator from configuration and the two capabilities.
    pub fn from_config(
        config: &ResolverConfig,
        store: Arc<dyn ObjectStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let cache = ObjectCache::with_url_ttl(store, config.store.url_ttl());
        let executor = FetchExecutor::from_config(
            fetcher,
            config.effective_scratch_path(),
            &config.fetcher,
        );
        Self::new(cache, executor, config.dedupe_fetches)
    }

    /// Returns true if concurrent fetches of one track are collapsed.
    pub fn dedupes_fetches(&self) -> bool {
        self.inflight.is_some()
    }

    /// Resolves a raw track ID.
    ///
    /// Invalid IDs are rejected before any store or fetcher call.
    pub async fn resolve(&self, raw_id: &str) -> Result<Resolution> {
        let track_id = TrackId::parse(raw_id)?;

        if let CacheLookup::Hit(url) = self.cache.lookup(&track_id).await {
            tracing::info!(track_id = %track_id, "track found in storage");
            return Ok(Resolution::Cached(url));
        }

        tracing::info!(track_id = %track_id, "track not found in storage, downloading");

        let url = match self.inflight {
            Some(ref inflight) => {
                tracing::debug!(in_flight = inflight.len(), "tracks currently fetching");
                inflight
                    .run(&track_id, || self.fetch_and_store(&track_id))
                    .await?
            }
            None => self.fetch_and_store(&track_id).await?,
        };

        Ok(Resolution::Fetched(url))
    }

    async fn fetch_and_store(&self, track_id: &TrackId) -> Result<String> {
        let artifact = self.executor.execute(track_id).await?;
        let uploaded = self.cache.put(track_id, artifact.path()).await;
        artifact.discard().await;
        uploaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryObjectStore;
    use crate::error::ErrorCode;
    use crate::testing::{FailingStore, FakeFetcher, StoreFailure};
    use std::path::Path;
    use std::time::{Duration, Instant};

    const ID: &str = "abcod1234567890ABCDEF1";

    struct Harness {
        coordinator: Arc<ResolutionCoordinator>,
        fetcher: FakeFetcher,
        store: Arc<MemoryObjectStore>,
        scratch: tempfile::TempDir,
    }

    fn harness(fetcher: FakeFetcher, dedupe: bool, timeout: Duration) -> Harness {
        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryObjectStore::new("tracks"));
        let executor = FetchExecutor::new(
            Arc::new(fetcher.clone()),
            scratch.path(),
            "https://open.spotify.com/track/{id}",
            timeout,
            Duration::ZERO,
        );
        let coordinator = ResolutionCoordinator::new(
            ObjectCache::new(store.clone()),
            executor,
            dedupe,
        );
        Harness {
            coordinator: Arc::new(coordinator),
            fetcher,
            store,
            scratch,
        }
    }

    fn scratch_entries(root: &Path) -> usize {
        std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn invalid_id_touches_nothing() {
        let h = harness(FakeFetcher::writes("song.mp3"), true, Duration::from_secs(5));

        let err = h.coordinator.resolve("short").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTrackId);
        assert_eq!(err.message, "Invalid Spotify track ID format");
        assert_eq!(h.fetcher.calls(), 0);
        assert!(h.store.is_empty());
        assert_eq!(scratch_entries(h.scratch.path()), 0);
    }

    #[tokio::test]
    async fn twenty_three_characters_is_invalid() {
        let h = harness(FakeFetcher::writes("song.mp3"), true, Duration::from_secs(5));

        let err = h.coordinator.resolve("abcod1234567890ABCDEF12").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTrackId);
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn cached_track_never_fetches() {
        let h = harness(FakeFetcher::writes("song.mp3"), true, Duration::from_secs(5));
        h.store.insert(format!("music/{}.mp3", ID), b"ID3".to_vec());

        let resolution = h.coordinator.resolve(ID).await.unwrap();
        assert!(resolution.is_cached());
        assert!(resolution.url().contains(&format!("music/{}.mp3", ID)));
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn miss_fetches_uploads_then_hits() {
        let h = harness(FakeFetcher::writes("Artist/song.mp3"), true, Duration::from_secs(5));

        let first = h.coordinator.resolve(ID).await.unwrap();
        assert!(!first.is_cached());
        assert!(first.url().contains(&format!("{}.mp3", ID)));
        assert!(first.url().contains("X-Signature="));
        assert!(h.store.contains(&format!("music/{}.mp3", ID)));
        assert_eq!(scratch_entries(h.scratch.path()), 0);

        let second = h.coordinator.resolve(ID).await.unwrap();
        assert!(second.is_cached());
        assert_eq!(h.fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn query_suffix_resolves_same_track() {
        let h = harness(FakeFetcher::writes("song.mp3"), true, Duration::from_secs(5));

        h.coordinator.resolve(ID).await.unwrap();
        let again = h
            .coordinator
            .resolve(&format!("{}?si=0123abcd", ID))
            .await
            .unwrap();
        assert!(again.is_cached());
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_once() {
        let h = harness(FakeFetcher::fails("ERROR: rate limited"), true, Duration::from_secs(5));

        let err = h.coordinator.resolve(ID).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::FetchFailed);
        assert_eq!(err.message, "Download failed: ERROR: rate limited");
        assert_eq!(h.fetcher.calls(), 1);
        assert!(h.store.is_empty());
        assert_eq!(scratch_entries(h.scratch.path()), 0);
    }

    #[tokio::test]
    async fn no_artifact_is_not_success() {
        let h = harness(FakeFetcher::writes_nothing(), true, Duration::from_secs(5));

        let err = h.coordinator.resolve(ID).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NoArtifact);
        assert_eq!(err.message, "No files downloaded");
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn timeout_is_bounded_and_leaves_no_workspace() {
        let h = harness(FakeFetcher::hangs("part.mp3"), true, Duration::from_millis(200));

        let started = Instant::now();
        let err = h.coordinator.resolve(ID).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::FetchTimedOut);
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(scratch_entries(h.scratch.path()), 0);
    }

    #[tokio::test]
    async fn upload_failure_is_upload_failed() {
        let scratch = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::writes("song.mp3");
        let executor = FetchExecutor::new(
            Arc::new(fetcher.clone()),
            scratch.path(),
            "https://open.spotify.com/track/{id}",
            Duration::from_secs(5),
            Duration::ZERO,
        );
        let coordinator = ResolutionCoordinator::new(
            ObjectCache::new(Arc::new(FailingStore::new(StoreFailure::Put))),
            executor,
            true,
        );

        let err = coordinator.resolve(ID).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UploadFailed);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(scratch_entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn cache_check_failure_falls_back_to_fetch() {
        let scratch = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::writes("song.mp3");
        let executor = FetchExecutor::new(
            Arc::new(fetcher.clone()),
            scratch.path(),
            "https://open.spotify.com/track/{id}",
            Duration::from_secs(5),
            Duration::ZERO,
        );
        let coordinator = ResolutionCoordinator::new(
            ObjectCache::new(Arc::new(FailingStore::new(StoreFailure::Exists))),
            executor,
            true,
        );

        // The failed existence check counts as a miss; FailingStore then
        // rejects the upload too
        let err = coordinator.resolve(ID).await.unwrap_err();
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(err.code, ErrorCode::UploadFailed);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let fetcher = FakeFetcher::writes("song.mp3").with_delay(Duration::from_millis(150));
        let h = harness(fetcher, true, Duration::from_secs(5));
        assert!(h.coordinator.dedupes_fetches());

        let (a, b) = tokio::join!(h.coordinator.resolve(ID), h.coordinator.resolve(ID));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(h.fetcher.calls(), 1);
        assert!(!a.is_cached() && !b.is_cached());
        assert_eq!(a.url(), b.url());
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn without_dedupe_concurrent_misses_fetch_twice() {
        let fetcher = FakeFetcher::writes("song.mp3").with_delay(Duration::from_millis(150));
        let h = harness(fetcher, false, Duration::from_secs(5));
        assert!(!h.coordinator.dedupes_fetches());

        let (a, b) = tokio::join!(h.coordinator.resolve(ID), h.coordinator.resolve(ID));
        assert!(a.is_ok() && b.is_ok());

        // Both uploads land on the same key; last writer wins
        assert_eq!(h.fetcher.calls(), 2);
        assert_eq!(h.store.len(), 1);
        assert_eq!(scratch_entries(h.scratch.path()), 0);
    }

    #[tokio::test]
    async fn concurrent_misses_across_tasks() {
        let fetcher = FakeFetcher::writes("song.mp3").with_delay(Duration::from_millis(150));
        let h = harness(fetcher, true, Duration::from_secs(5));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let coordinator = Arc::clone(&h.coordinator);
                tokio::spawn(async move { coordinator.resolve(ID).await })
            })
            .collect();

        let mut urls = Vec::new();
        for handle in handles {
            urls.push(handle.await.unwrap().unwrap().url().to_string());
        }

        assert_eq!(h.fetcher.calls(), 1);
        assert!(urls.windows(2).all(|w| w[0] == w[1]));
    }
}
