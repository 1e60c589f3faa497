//! Media acquisition.
//!
//! Wraps the external fetcher: per-job scratch workspaces, the timeout,
//! and locating the produced audio file.

pub mod executor;
pub mod fetcher;
pub mod workspace;

// Re-export commonly used types
pub use executor::{find_artifact, FetchExecutor, FetchedArtifact};
pub use fetcher::{CommandFetcher, FetchError, Fetcher};
pub use workspace::ScratchWorkspace;
