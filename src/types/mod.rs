//! Core types for the track resolver.
//!
//! - [`TrackId`]: A validated 22-character track identifier
//! - [`FetchJob`]: One acquisition of a track into a scratch workspace
//! - [`Resolution`]: Where a returned access URL came from

mod job;
mod resolution;
mod track;

pub use job::{FetchJob, FetchStatus};
pub use resolution::{Resolution, ResolvedTrack};
pub use track::{
    canonicalize, is_valid_track_id, TrackId, ARTIFACT_EXTENSION, OBJECT_KEY_PREFIX,
    TRACK_ID_LEN,
};
