//! Fetch execution.
//!
//! Runs the fetcher against a fresh scratch workspace under a timeout,
//! waits for the output to settle, and locates the produced audio file.
//! The workspace is removed on every exit path; on success it lives on
//! inside the returned [`FetchedArtifact`] until the caller has uploaded it
//! and calls [`FetchedArtifact::discard`] (or drops it).

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::FetcherConfig;
use crate::types::{FetchJob, TrackId, ARTIFACT_EXTENSION};

use super::fetcher::{FetchError, Fetcher};
use super::workspace::ScratchWorkspace;

/// A located artifact and the workspace holding it.
///
/// Dropping this removes the workspace and the artifact with it.
#[derive(Debug)]
pub struct FetchedArtifact {
    /// Completed job record.
    pub job: FetchJob,
    path: PathBuf,
    workspace: ScratchWorkspace,
}

impl FetchedArtifact {
    /// Path of the produced audio file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the workspace and the artifact with it.
    pub async fn discard(self) {
        self.workspace.remove().await;
    }
}

/// Runs fetches with a timeout and guaranteed cleanup.
#[derive(Clone)]
pub struct FetchExecutor {
    fetcher: Arc<dyn Fetcher>,
    scratch_root: PathBuf,
    source_template: String,
    timeout: Duration,
    settle_delay: Duration,
}

impl FetchExecutor {
    /// Creates an executor.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        scratch_root: impl Into<PathBuf>,
        source_template: impl Into<String>,
        timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            scratch_root: scratch_root.into(),
            source_template: source_template.into(),
            timeout,
            settle_delay,
        }
    }

    /// Creates an executor from configuration.
    pub fn from_config(
        fetcher: Arc<dyn Fetcher>,
        scratch_root: impl Into<PathBuf>,
        config: &FetcherConfig,
    ) -> Self {
        Self::new(
            fetcher,
            scratch_root,
            config.source_template.clone(),
            config.timeout(),
            config.settle_delay(),
        )
    }

    /// Fetches a track into a new scratch workspace.
    pub async fn execute(&self, track_id: &TrackId) -> Result<FetchedArtifact, FetchError> {
        let workspace = ScratchWorkspace::create(&self.scratch_root).await?;

        let mut job = FetchJob::new(
            workspace.name(),
            track_id.clone(),
            track_id.source_url(&self.source_template),
            workspace.path().to_path_buf(),
        );
        job.set_fetching();
        tracing::info!(track_id = %track_id, job_id = %job.job_id, "starting fetch");

        match self.run(&job).await {
            Ok(path) => {
                job.set_complete(path.clone());
                tracing::info!(
                    track_id = %track_id,
                    job_id = %job.job_id,
                    elapsed_ms = job.elapsed().as_millis() as u64,
                    artifact = %path.display(),
                    "fetch complete"
                );
                Ok(FetchedArtifact {
                    job,
                    path,
                    workspace,
                })
            }
            Err(err) => {
                job.set_failed(&err.to_string());
                tracing::warn!(
                    track_id = %track_id,
                    job_id = %job.job_id,
                    elapsed_ms = job.elapsed().as_millis() as u64,
                    error = %err,
                    "fetch failed"
                );
                workspace.remove().await;
                Err(err)
            }
        }
    }

    async fn run(&self, job: &FetchJob) -> Result<PathBuf, FetchError> {
        // On timeout the fetch future is dropped, which kills a child process
        match tokio::time::timeout(
            self.timeout,
            self.fetcher.fetch(&job.source_url, &job.workspace),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::TimedOut(self.timeout)),
        }

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let root = job.workspace.clone();
        let found = tokio::task::spawn_blocking(move || find_artifact(&root, ARTIFACT_EXTENSION))
            .await
            .map_err(|e| FetchError::Unexpected(e.to_string()))??;

        found.ok_or(FetchError::NoArtifact)
    }
}

/// Recursively searches `root` for a file with `extension` (ASCII
/// case-insensitive). Returns the lexicographically first match so the
/// choice is stable when several files were produced.
pub fn find_artifact(root: &Path, extension: &str) -> io::Result<Option<PathBuf>> {
    let mut matches = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && has_extension(&path, extension) {
                matches.push(path);
            }
        }
    }

    matches.sort();
    Ok(matches.into_iter().next())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
