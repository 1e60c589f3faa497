//! External media fetcher capability.
//!
//! A [`Fetcher`] turns a source URL into files inside a workspace
//! directory. [`CommandFetcher`] runs an external program as a child
//! process; tests substitute in-process fakes.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::config::FetcherConfig;
use crate::error::{ErrorCode, ResolverError};

/// Errors from a fetch attempt.
///
/// Messages are shown to callers, so they never include the command line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The fetcher exited non-zero; carries its diagnostic output.
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// The fetcher did not finish in time.
    #[error("Download timed out")]
    TimedOut(Duration),

    /// The fetcher succeeded but left no audio file behind.
    #[error("No files downloaded")]
    NoArtifact,

    /// Anything else: workspace I/O, launch failure, task failure.
    #[error("Error during processing: {0}")]
    Unexpected(String),
}

impl FetchError {
    /// Returns the matching error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            FetchError::DownloadFailed(_) => ErrorCode::FetchFailed,
            FetchError::TimedOut(_) => ErrorCode::FetchTimedOut,
            FetchError::NoArtifact => ErrorCode::NoArtifact,
            FetchError::Unexpected(_) => ErrorCode::Internal,
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Unexpected(err.to_string())
    }
}

impl From<FetchError> for ResolverError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Unexpected(detail) => ResolverError::internal(detail),
            other => ResolverError::new(other.code(), other.to_string()),
        }
    }
}

/// Runs one acquisition into `workspace`.
///
/// Implementations must write only inside `workspace` and must be safe to
/// cancel by dropping the returned future.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source_url: &str, workspace: &Path) -> Result<(), FetchError>;
}

/// Fetcher backed by an external program.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandFetcher {
    /// Creates a fetcher running `program` with an argument template.
    ///
    /// `{url}` and `{output_dir}` in `args` are replaced per run.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Creates a fetcher from configuration.
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    /// Expands the argument template for one run.
    pub fn render_args(&self, source_url: &str, workspace: &Path) -> Vec<String> {
        let output_dir = workspace.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{url}", source_url)
                    .replace("{output_dir}", &output_dir)
            })
            .collect()
    }
}

#[async_trait]
impl Fetcher for CommandFetcher {
    async fn fetch(&self, source_url: &str, workspace: &Path) -> Result<(), FetchError> {
        // The child gets the workspace as its own cwd; the process-wide
        // cwd is never touched.
        let mut command = Command::new(&self.program);
        command
            .args(self.render_args(source_url, workspace))
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so helpers the fetcher starts can be killed with it
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| FetchError::Unexpected(format!("could not start fetcher: {}", e)))?;
        let group = ProcessGroupGuard::new(child.id());

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| FetchError::Unexpected(format!("fetcher I/O failed: {}", e)))?;
        group.disarm();

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(output = %stdout.trim(), "fetcher stdout");
        }

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = %output.status, "fetcher exited with failure");
            Err(FetchError::DownloadFailed(stderr))
        }
    }
}

/// Kills the fetcher's process group if dropped before [`disarm`].
///
/// Dropping the fetch future (timeout) only kills the direct child through
/// `kill_on_drop`; this takes down anything it spawned as well.
///
/// [`disarm`]: ProcessGroupGuard::disarm
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    /// The fetcher exited on its own; leave the group alone.
    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    #[cfg(unix)]
    fn drop(&mut self) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(pgid) = self.pgid.take() else {
            return;
        };
        match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
            Ok(()) => tracing::debug!(pgid, "killed fetcher process group"),
            Err(Errno::ESRCH) => {}
            Err(e) => tracing::warn!(pgid, error = %e, "failed to kill fetcher process group"),
        }
    }

    #[cfg(not(unix))]
    fn drop(&mut self) {
        self.pgid = None;
    }
}
