//! HTTP boundary.
//!
//! A single route, `GET /download/{track_id}`, answering
//! `{"url": ..., "cached": ...}` or `{"error": ...}`. CORS is open to any
//! origin; the CORS layer answers `OPTIONS` preflights itself.

pub mod error;
pub mod routes;
pub mod state;

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};
pub use state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/download/{track_id}", get(routes::download))
        .fallback(routes::not_found)
        .layer(CatchPanicLayer::custom(routes::handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested, draining connections"),
        Err(e) => {
            tracing::error!(error = %e, "could not listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
