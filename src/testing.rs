//! Test doubles for the fetcher and object store capabilities.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{ObjectStore, StoreError};
use crate::fetch::{FetchError, Fetcher};

/// What a [`FakeFetcher`] does when run.
#[derive(Debug, Clone)]
enum Behavior {
    /// Writes a file at this path relative to the workspace.
    Writes(String),
    /// Succeeds without writing anything.
    WritesNothing,
    /// Fails with this stderr.
    Fails(String),
    /// Writes a partial file, then never finishes.
    Hangs(String),
    /// Fails with an unexpected fault.
    Errors(String),
    /// Replaces the workspace directory with a file, then fails with this
    /// stderr, so the cleanup afterwards cannot succeed.
    BreaksCleanup(String),
}

/// In-process fetcher with scripted behavior and a call counter.
#[derive(Debug, Clone)]
pub struct FakeFetcher {
    behavior: Behavior,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl FakeFetcher {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn writes(relative: &str) -> Self {
        Self::with_behavior(Behavior::Writes(relative.to_string()))
    }

    pub fn writes_nothing() -> Self {
        Self::with_behavior(Behavior::WritesNothing)
    }

    pub fn fails(stderr: &str) -> Self {
        Self::with_behavior(Behavior::Fails(stderr.to_string()))
    }

    pub fn hangs(partial: &str) -> Self {
        Self::with_behavior(Behavior::Hangs(partial.to_string()))
    }

    pub fn errors(detail: &str) -> Self {
        Self::with_behavior(Behavior::Errors(detail.to_string()))
    }

    pub fn breaks_cleanup(stderr: &str) -> Self {
        Self::with_behavior(Behavior::BreaksCleanup(stderr.to_string()))
    }

    /// Sleeps before acting, to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of times `fetch` was entered.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, source_url: &str, workspace: &Path) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            Behavior::Writes(relative) => {
                let path = workspace.join(relative);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, source_url.as_bytes()).await?;
                Ok(())
            }
            Behavior::WritesNothing => Ok(()),
            Behavior::Fails(stderr) => Err(FetchError::DownloadFailed(stderr.clone())),
            Behavior::Hangs(partial) => {
                tokio::fs::write(workspace.join(partial), b"partial").await?;
                std::future::pending::<()>().await;
                Ok(())
            }
            Behavior::Errors(detail) => Err(FetchError::Unexpected(detail.clone())),
            Behavior::BreaksCleanup(stderr) => {
                tokio::fs::remove_dir_all(workspace).await?;
                tokio::fs::write(workspace, b"not a directory").await?;
                Err(FetchError::DownloadFailed(stderr.clone()))
            }
        }
    }
}

/// Which operation a [`FailingStore`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    Exists,
    Presign,
    Put,
}

/// Store that fails one operation and claims the object exists otherwise.
///
/// With `Put`, `exists` reports false so lookups miss.
#[derive(Debug)]
pub struct FailingStore {
    failure: StoreFailure,
}

impl FailingStore {
    pub fn new(failure: StoreFailure) -> Self {
        Self { failure }
    }
}

#[async_trait]
impl ObjectStore for FailingStore {
    async fn exists(&self, _key: &str) -> Result<bool, StoreError> {
        match self.failure {
            StoreFailure::Exists => Err(StoreError::Request("connection reset".to_string())),
            StoreFailure::Presign => Ok(true),
            StoreFailure::Put => Ok(false),
        }
    }

    async fn presigned_get_url(
        &self,
        key: &str,
        _expires_in: Duration,
    ) -> Result<String, StoreError> {
        match self.failure {
            StoreFailure::Presign => Err(StoreError::Presign("no credentials".to_string())),
            _ => Ok(format!("https://failing.local/{}", key)),
        }
    }

    async fn put_file(
        &self,
        _key: &str,
        _path: &Path,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        Err(StoreError::Request("access denied".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
