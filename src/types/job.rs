//! FetchJob type for tracking a single media acquisition.
//!
//! A FetchJob lives for one cache miss: it is created when the fetcher is
//! started and ends when the scratch workspace is removed.

use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use super::track::TrackId;

/// Status of a fetch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// Workspace allocated, fetcher not started yet.
    #[default]
    Pending,
    /// External fetcher running.
    Fetching,
    /// Artifact located in the workspace.
    Complete,
    /// Fetch failed, timed out, or produced nothing.
    Failed,
}

/// One acquisition of one track into an isolated scratch workspace.
#[derive(Debug, Clone, Serialize)]
pub struct FetchJob {
    /// Unique job identifier; also the workspace directory name.
    pub job_id: String,

    /// Track being fetched.
    pub track_id: TrackId,

    /// Upstream URL handed to the fetcher.
    pub source_url: String,

    /// Scratch directory the fetcher writes into.
    pub workspace: PathBuf,

    /// Current job state.
    pub status: FetchStatus,

    /// Located artifact, set on success.
    pub artifact: Option<PathBuf>,

    /// Failure reason, set on failure.
    pub failure: Option<String>,

    /// When the job was created.
    #[serde(with = "system_time_serde")]
    pub created_at: SystemTime,

    /// When the job reached a terminal state.
    #[serde(with = "option_system_time_serde")]
    pub finished_at: Option<SystemTime>,
}

impl FetchJob {
    /// Creates a new pending FetchJob.
    pub fn new(
        job_id: impl Into<String>,
        track_id: TrackId,
        source_url: String,
        workspace: PathBuf,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            track_id,
            source_url,
            workspace,
            status: FetchStatus::Pending,
            artifact: None,
            failure: None,
            created_at: SystemTime::now(),
            finished_at: None,
        }
    }

    /// Marks the job as fetching.
    pub fn set_fetching(&mut self) {
        self.status = FetchStatus::Fetching;
    }

    /// Marks the job as complete with the located artifact.
    pub fn set_complete(&mut self, artifact: PathBuf) {
        self.status = FetchStatus::Complete;
        self.artifact = Some(artifact);
        self.finished_at = Some(SystemTime::now());
    }

    /// Marks the job as failed with a reason.
    pub fn set_failed(&mut self, reason: &str) {
        self.status = FetchStatus::Failed;
        self.failure = Some(reason.to_string());
        self.finished_at = Some(SystemTime::now());
    }

    /// Time from creation to completion, or to now if still running.
    pub fn elapsed(&self) -> Duration {
        let end = self.finished_at.unwrap_or_else(SystemTime::now);
        end.duration_since(self.created_at).unwrap_or_default()
    }
}

/// Custom serde implementation for SystemTime.
mod system_time_serde {
    use serde::{Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        duration.as_secs().serialize(serializer)
    }
}

/// Custom serde implementation for Option<SystemTime>.
mod option_system_time_serde {
    use serde::{Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        time.map(|t| t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs())
            .serialize(serializer)
    }
}
