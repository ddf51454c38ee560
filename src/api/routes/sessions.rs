//! Session lifecycle handlers.

use super::{error_response, is_valid_youtube_url};
use crate::api::AppState;
use crate::deemix::BITRATE_128;
use crate::error::ApiError;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Request body for starting an analysis
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// YouTube playlist, video or YouTube Music URL
    pub url: String,
    /// Bitrate code (9 = FLAC, 3 = 320 kbps, 1 = 128 kbps); 0 defaults to 128 kbps
    #[serde(default)]
    pub bitrate: u32,
    /// Whether to check the Navidrome library for already-owned tracks
    #[serde(default)]
    pub check_navidrome: bool,
}

/// Response body for a started analysis
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    /// The new session's id
    pub session_id: String,
}

/// POST /api/analyze - Start analyzing a playlist
#[utoipa::path(
    post,
    path = "/api/analyze",
    tag = "sessions",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis started", body = AnalyzeResponse),
        (status = 400, description = "Missing or invalid URL", body = ApiError)
    )
)]
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    if req.url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("url is required")),
        )
            .into_response();
    }
    if !is_valid_youtube_url(&req.url) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("invalid YouTube URL")),
        )
            .into_response();
    }

    let bitrate = if req.bitrate == 0 { BITRATE_128 } else { req.bitrate };
    let session_id = state
        .pipeline
        .analyze(&req.url, bitrate, req.check_navidrome)
        .await;

    Json(AnalyzeResponse { session_id }).into_response()
}

/// GET /api/session/{id} - Get a session snapshot
#[utoipa::path(
    get,
    path = "/api/session/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session snapshot", body = crate::types::Session),
        (status = 404, description = "Session not found", body = ApiError)
    )
)]
pub async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.pipeline.get_session(&id).await {
        Some(session) => Json(session).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new("session_not_found", format!("session {id} not found"))),
        )
            .into_response(),
    }
}

/// POST /api/session/{id}/download - Queue all selected tracks
#[utoipa::path(
    post,
    path = "/api/session/{id}/download",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Download started"),
        (status = 400, description = "Session is not ready", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError)
    )
)]
pub async fn download_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.pipeline.download(&id).await {
        Ok(()) => Json(json!({"status": "downloading"})).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /api/session/{id}/pause - Pause an active session
#[utoipa::path(
    post,
    path = "/api/session/{id}/pause",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Pause requested"),
        (status = 400, description = "Session is not active", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError)
    )
)]
pub async fn pause_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.pipeline.pause_session(&id).await {
        Ok(()) => Json(json!({"status": "paused"})).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /api/session/{id}/resume - Resume a paused session
#[utoipa::path(
    post,
    path = "/api/session/{id}/resume",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Resume requested"),
        (status = 400, description = "Session is not paused", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError)
    )
)]
pub async fn resume_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.pipeline.resume_session(&id).await {
        Ok(()) => Json(json!({"status": "resumed"})).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /api/session/{id}/cancel - Cancel a session
#[utoipa::path(
    post,
    path = "/api/session/{id}/cancel",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session canceled"),
        (status = 400, description = "Session already terminal", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError)
    )
)]
pub async fn cancel_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.pipeline.cancel_session(&id).await {
        Ok(()) => Json(json!({"status": "canceled"})).into_response(),
        Err(e) => error_response(&e),
    }
}
