//! Shared HTTP handler state.

use std::sync::Arc;

use crate::resolve::ResolutionCoordinator;

/// State handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Coordinator shared by all requests.
    pub coordinator: Arc<ResolutionCoordinator>,
}

impl AppState {
    pub fn new(coordinator: Arc<ResolutionCoordinator>) -> Self {
        Self { coordinator }
    }
}
