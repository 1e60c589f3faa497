//! track-resolver: resolves track IDs to time-limited download URLs.
//!
//! A request names a track by its 22-character ID. If the audio is already
//! in the object store a fresh presigned URL is returned; otherwise an
//! external fetcher downloads it into a scratch workspace, the file is
//! uploaded, and the URL for the new object is returned.
//!
//! # Modules
//!
//! - [`types`]: Track IDs, fetch jobs, resolution results
//! - [`cache`]: Object store capability, S3 and in-memory backends, track cache
//! - [`fetch`]: External fetcher, scratch workspaces, fetch execution
//! - [`resolve`]: The resolution state machine and fetch de-duplication
//! - [`server`]: HTTP boundary
//! - [`config`]: Runtime configuration (ResolverConfig)
//! - [`error`]: Error types and codes (ResolverError, ErrorCode)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use track_resolver::{
//!     cache::{MemoryObjectStore, ObjectCache},
//!     fetch::{CommandFetcher, FetchExecutor},
//!     resolve::ResolutionCoordinator,
//!     config::ResolverConfig,
//! };
//!
//! let config = ResolverConfig::default();
//! let cache = ObjectCache::new(Arc::new(MemoryObjectStore::new("local")));
//! let executor = FetchExecutor::from_config(
//!     Arc::new(CommandFetcher::from_config(&config.fetcher)),
//!     config.effective_scratch_path(),
//!     &config.fetcher,
//! );
//! let coordinator = ResolutionCoordinator::new(cache, executor, true);
//!
//! let resolution = coordinator.resolve("4cOdK2wGLETKBW3PvgPWqT").await?;
//! println!("{} (cached: {})", resolution.url(), resolution.is_cached());
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod resolve;
pub mod server;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used types at crate root for convenience
pub use config::{ResolverConfig, StoreBackend};
pub use error::{ErrorCode, ResolverError, Result};
pub use resolve::ResolutionCoordinator;
pub use types::{Resolution, ResolvedTrack, TrackId};
