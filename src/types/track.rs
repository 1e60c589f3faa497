//! Track identifier validation.
//!
//! A TrackId is the canonical 22-character alphanumeric identifier of a
//! track. Raw identifiers are validated here before any cache or fetch work
//! happens, since the object key is built directly from the ID.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{ResolverError, Result};

/// Length of a canonical track ID.
pub const TRACK_ID_LEN: usize = 22;

/// Prefix of every cached object key.
pub const OBJECT_KEY_PREFIX: &str = "music";

/// File extension of cached objects and fetched artifacts.
pub const ARTIFACT_EXTENSION: &str = "mp3";

/// A validated track identifier.
///
/// Only constructible through [`TrackId::parse`], so holding one proves the
/// value is exactly 22 characters from `[0-9A-Za-z]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Validates a raw identifier.
    ///
    /// Anything from the first `?` onward (a share-link query string) is
    /// stripped before the check.
    pub fn parse(raw: &str) -> Result<Self> {
        let canonical = canonicalize(raw);
        if is_canonical(canonical) {
            Ok(Self(canonical.to_string()))
        } else {
            Err(ResolverError::invalid_track_id())
        }
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the object-store key for this track: `music/{id}.mp3`.
    pub fn object_key(&self) -> String {
        format!("{}/{}.{}", OBJECT_KEY_PREFIX, self.0, ARTIFACT_EXTENSION)
    }

    /// Builds the upstream source URL by substituting `{id}` in `template`.
    pub fn source_url(&self, template: &str) -> String {
        template.replace("{id}", &self.0)
    }
}

impl FromStr for TrackId {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strips everything from the first `?` onward.
pub fn canonicalize(raw: &str) -> &str {
    match raw.split_once('?') {
        Some((head, _)) => head,
        None => raw,
    }
}

/// Returns true if `raw` would be accepted by [`TrackId::parse`].
pub fn is_valid_track_id(raw: &str) -> bool {
    is_canonical(canonicalize(raw))
}

fn is_canonical(s: &str) -> bool {
    s.len() == TRACK_ID_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric())
}
