//! Request resolution.
//!
//! Ties the track cache and the fetch executor together and optionally
//! collapses concurrent fetches of the same track.

pub mod coordinator;
pub mod inflight;

pub use coordinator::ResolutionCoordinator;
pub use inflight::InFlight;
