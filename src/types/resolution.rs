//! Outcome of a successful resolution.

use serde::Serialize;

/// Where the returned access URL came from.
///
/// The failure arm of a resolution is `Err(ResolverError)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The object was already in the store.
    Cached(String),
    /// The object was fetched and uploaded during this request.
    Fetched(String),
}

impl Resolution {
    /// Returns the time-limited access URL.
    pub fn url(&self) -> &str {
        match self {
            Resolution::Cached(url) | Resolution::Fetched(url) => url,
        }
    }

    /// Returns true if no fetch was needed.
    pub fn is_cached(&self) -> bool {
        matches!(self, Resolution::Cached(_))
    }
}

/// JSON body returned to callers on success: `{"url": ..., "cached": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTrack {
    pub url: String,
    pub cached: bool,
}

impl From<Resolution> for ResolvedTrack {
    fn from(resolution: Resolution) -> Self {
        let cached = resolution.is_cached();
        let url = match resolution {
            Resolution::Cached(url) | Resolution::Fetched(url) => url,
        };
        Self { url, cached }
    }
}
