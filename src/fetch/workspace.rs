//! Per-fetch scratch workspace.
//!
//! Each fetch gets its own directory under the scratch root, named by a
//! nanosecond timestamp plus a random token so concurrent fetches (even of
//! the same track) never share one. Normal exits remove it on the blocking
//! pool with [`ScratchWorkspace::remove`]; dropping the guard without that
//! (cancellation, panics) removes it inline.
//!
//! A failed removal is logged and never turns into a request error.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Owned scratch directory, deleted on removal or drop.
#[derive(Debug)]
pub struct ScratchWorkspace {
    name: String,
    path: PathBuf,
    removed: bool,
}

impl ScratchWorkspace {
    /// Creates a fresh, uniquely named directory under `root`.
    pub async fn create(root: &Path) -> io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;

        let name = unique_name();
        let path = root.join(&name);
        // create_dir (not create_dir_all) so a name collision is an error
        tokio::fs::create_dir(&path).await?;

        tracing::debug!(path = %path.display(), "created scratch workspace");
        Ok(Self {
            name,
            path,
            removed: false,
        })
    }

    /// Directory name, used as the fetch job ID.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the directory off the async worker threads.
    pub async fn remove(mut self) {
        let path = self.path.clone();
        match tokio::task::spawn_blocking(move || std::fs::remove_dir_all(&path)).await {
            Ok(result) => {
                self.removed = true;
                report_removal(&self.path, result);
            }
            // Drop retries inline
            Err(e) => tracing::warn!(error = %e, "workspace removal task failed"),
        }
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if !self.removed {
            report_removal(&self.path, std::fs::remove_dir_all(&self.path));
        }
    }
}

fn report_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => tracing::debug!(path = %path.display(), "removed scratch workspace"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::error!(
            path = %path.display(),
            error = %e,
            "failed to remove scratch workspace"
        ),
    }
}

fn unique_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{}-{}", nanos, hex::encode(rand::random::<[u8; 4]>()))
}
