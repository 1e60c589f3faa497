//! Request handlers.

use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::ResolverError;
use crate::types::ResolvedTrack;

use super::error::ApiError;
use super::state::AppState;

/// `GET /download/{track_id}`
///
/// The resolution runs in its own task: if the client goes away the fetch
/// still completes (or times out) and the result lands in the cache.
/// A segment that does not decode to UTF-8 is an invalid ID like any other.
pub async fn download(
    State(state): State<AppState>,
    track_id: Result<Path<String>, PathRejection>,
) -> Result<Json<ResolvedTrack>, ApiError> {
    let Path(track_id) = track_id.map_err(|rejection| {
        tracing::debug!(error = %rejection, "undecodable track ID");
        ApiError::from(ResolverError::invalid_track_id())
    })?;

    let coordinator = Arc::clone(&state.coordinator);
    let task = tokio::spawn(async move { coordinator.resolve(&track_id).await });

    let resolution = task
        .await
        .map_err(|e| ApiError::Internal(format!("resolution task failed: {}", e)))??;

    Ok(Json(ResolvedTrack::from(resolution)))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Converts a handler panic into the JSON 500 response.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}
