//! Error types for the track resolver.
//!
//! Defines the error codes and the crate-wide error type used by the
//! resolution pipeline and reported at the HTTP boundary.

use std::fmt;

/// Error codes attached to every resolution failure.
///
/// These codes let callers (and logs) tell the failing stage apart without
/// parsing the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The track ID is not 22 alphanumeric characters.
    /// Trigger: Malformed path segment. No cache or fetch work is attempted.
    InvalidTrackId,

    /// The external fetcher did not finish within the timeout.
    FetchTimedOut,

    /// The external fetcher exited with a non-zero status.
    FetchFailed,

    /// The fetcher reported success but no audio file was found.
    NoArtifact,

    /// The artifact could not be uploaded to the object store,
    /// or no access URL could be issued for it afterwards.
    UploadFailed,

    /// Unexpected fault (workspace I/O, task failure, fetcher launch).
    Internal,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidTrackId => "INVALID_TRACK_ID",
            ErrorCode::FetchTimedOut => "FETCH_TIMED_OUT",
            ErrorCode::FetchFailed => "FETCH_FAILED",
            ErrorCode::NoArtifact => "NO_ARTIFACT",
            ErrorCode::UploadFailed => "UPLOAD_FAILED",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidTrackId => "Track ID must be exactly 22 alphanumeric characters",
            ErrorCode::FetchTimedOut => "The media fetcher exceeded its time limit",
            ErrorCode::FetchFailed => "The media fetcher exited with an error",
            ErrorCode::NoArtifact => "The media fetcher produced no audio file",
            ErrorCode::UploadFailed => "The audio file could not be stored",
            ErrorCode::Internal => "Unexpected error while processing the track",
        }
    }

    /// Returns true if the caller is at fault (maps to HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(self, ErrorCode::InvalidTrackId)
    }

    /// Returns true if the failure happened while acquiring the media.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::FetchTimedOut | ErrorCode::FetchFailed | ErrorCode::NoArtifact
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for resolution operations.
///
/// Cloneable so a single outcome can be delivered to every caller
/// waiting on the same in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverError {
    /// The error code identifying the failing stage.
    pub code: ErrorCode,
    /// Message safe to show to the caller.
    pub message: String,
}

impl ResolverError {
    /// Creates a new ResolverError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an INVALID_TRACK_ID error.
    pub fn invalid_track_id() -> Self {
        Self::new(ErrorCode::InvalidTrackId, "Invalid Spotify track ID format")
    }

    /// Creates an UPLOAD_FAILED error.
    pub fn upload_failed(reason: impl fmt::Display) -> Self {
        Self::new(ErrorCode::UploadFailed, format!("Upload error: {}", reason))
    }

    /// Creates an INTERNAL error.
    pub fn internal(reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Internal,
            format!("Error during processing: {}", reason),
        )
    }
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ResolverError {}

/// Result type alias using ResolverError.
pub type Result<T> = std::result::Result<T, ResolverError>;
