//! Process stats and integration status handlers.

use crate::api::AppState;
use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lightweight process statistics
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    /// Seconds since process start
    pub uptime_sec: f64,
    /// Number of sessions held by the engine
    pub sessions: usize,
}

/// GET /api/stats - Process statistics
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "system",
    responses((status = 200, description = "Process statistics", body = StatsResponse))
)]
pub async fn stats(State(state): State<AppState>) -> Response {
    Json(StatsResponse {
        uptime_sec: state.started_at.elapsed().as_secs_f64(),
        sessions: state.pipeline.session_count().await,
    })
    .into_response()
}

/// Navidrome integration status, for the frontend's default checkbox
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NavidromeStatusResponse {
    /// Whether a Navidrome instance is configured
    pub configured: bool,
    /// Whether the library check should default to on
    pub skip_default: bool,
}

/// GET /api/navidrome/status - Navidrome integration status
#[utoipa::path(
    get,
    path = "/api/navidrome/status",
    tag = "system",
    responses((status = 200, description = "Integration status", body = NavidromeStatusResponse))
)]
pub async fn navidrome_status(State(state): State<AppState>) -> Response {
    let (configured, skip_default) = match &state.config.navidrome {
        Some(nav) => (true, nav.skip_default),
        None => (false, false),
    };
    Json(NavidromeStatusResponse {
        configured,
        skip_default,
    })
    .into_response()
}
