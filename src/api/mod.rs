//! REST API server module
//!
//! Thin HTTP wrapper over the session engine. The heavy lifting happens in
//! [`crate::pipeline`]; handlers validate input, delegate and map errors to
//! status codes.

use crate::error::{Error, Result};
use axum::{
    Json, Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Sessions
/// - `POST /api/analyze` - Start analyzing a playlist
/// - `GET /api/session/:id` - Get a session snapshot
/// - `POST /api/session/:id/download` - Queue all selected tracks
/// - `POST /api/session/:id/pause` - Pause an active session
/// - `POST /api/session/:id/resume` - Resume a paused session
/// - `POST /api/session/:id/cancel` - Cancel a session
///
/// ## Tracks
/// - `POST /api/session/:id/track/:index/select` - Toggle track selection
/// - `POST /api/session/:id/track/:index/search` - Manually re-match a track
///
/// ## Channel / previews
/// - `GET /api/channel/playlists` - List all playlists on a channel
/// - `GET /api/url/info` - Resolve a URL's title
///
/// ## System
/// - `GET /api/stats` - Process statistics
/// - `GET /api/navidrome/status` - Navidrome integration status
/// - `GET /api/openapi.json` - OpenAPI specification
pub fn create_router(state: AppState) -> Router {
    let dev_mode = state.config.server.dev_mode;

    let router = Router::new()
        // Sessions
        .route("/api/analyze", post(routes::analyze))
        .route("/api/session/:id", get(routes::get_session))
        .route("/api/session/:id/download", post(routes::download_session))
        .route("/api/session/:id/pause", post(routes::pause_session))
        .route("/api/session/:id/resume", post(routes::resume_session))
        .route("/api/session/:id/cancel", post(routes::cancel_session))
        // Tracks
        .route(
            "/api/session/:id/track/:index/select",
            post(routes::select_track),
        )
        .route(
            "/api/session/:id/track/:index/search",
            post(routes::search_track),
        )
        // Channel / previews
        .route("/api/channel/playlists", get(routes::channel_playlists))
        .route("/api/url/info", get(routes::url_info))
        // System
        .route("/api/stats", get(routes::stats))
        .route("/api/navidrome/status", get(routes::navidrome_status))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .with_state(state);

    if dev_mode {
        // Frontend dev servers run on a different origin.
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Bind and serve the API until the process receives a shutdown signal.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let router = create_router(state);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::ApiServer(format!("failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "API server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(crate::shutdown_signal())
        .await
        .map_err(|e| Error::ApiServer(format!("server error: {e}")))
}
