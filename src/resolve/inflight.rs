//! Per-track fetch de-duplication.
//!
//! Concurrent cache misses for the same track share one fetch-and-upload:
//! the first caller runs it, later callers wait for its outcome. Entries
//! are removed once the operation finishes, so a later miss (for example
//! after the stored object was deleted) starts a new fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use crate::error::Result;
use crate::types::TrackId;

type Slot = Arc<OnceCell<Result<String>>>;

/// Registry of in-progress fetches keyed by track ID.
#[derive(Default)]
pub struct InFlight {
    pending: Mutex<HashMap<TrackId, Slot>>,
}

impl InFlight {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `op` for `track_id` unless one is already running, in which
    /// case waits for that one and returns its outcome.
    ///
    /// If the running caller is cancelled, one of the waiters takes over
    /// and runs its own `op`.
    pub async fn run<F, Fut>(&self, track_id: &TrackId, op: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let slot = {
            let mut pending = self.pending.lock().unwrap();
            Arc::clone(pending.entry(track_id.clone()).or_default())
        };

        let mut ran = false;
        let outcome = slot
            .get_or_init(|| {
                ran = true;
                op()
            })
            .await
            .clone();

        if !ran {
            tracing::debug!(track_id = %track_id, "joined in-flight fetch");
        }

        let mut pending = self.pending.lock().unwrap();
        if pending
            .get(track_id)
            .is_some_and(|current| Arc::ptr_eq(current, &slot))
        {
            pending.remove(track_id);
        }

        outcome
    }

    /// Number of tracks currently being fetched.
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Returns true if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().unwrap().is_empty()
    }
}
