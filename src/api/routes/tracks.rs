//! Per-track handlers: selection toggling and manual re-search.

use super::error_response;
use crate::api::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for toggling track selection
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectRequest {
    /// The desired selection state
    pub selected: bool,
}

/// Response body echoing the new selection state
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectResponse {
    /// The selection state after the update
    pub selected: bool,
}

/// POST /api/session/{id}/track/{index}/select - Toggle track selection
#[utoipa::path(
    post,
    path = "/api/session/{id}/track/{index}/select",
    tag = "tracks",
    params(
        ("id" = String, Path, description = "Session id"),
        ("index" = usize, Path, description = "Track index"),
    ),
    request_body = SelectRequest,
    responses(
        (status = 200, description = "Selection updated", body = SelectResponse),
        (status = 400, description = "Session is not ready", body = ApiError),
        (status = 404, description = "Session or track not found", body = ApiError)
    )
)]
pub async fn select_track(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
    Json(req): Json<SelectRequest>,
) -> Response {
    match state.pipeline.set_track_selected(&id, index, req.selected).await {
        Ok(()) => Json(SelectResponse {
            selected: req.selected,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Request body for a manual track search
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// The user-edited portion of the query; the parsed artist is prepended
    pub query: String,
}

/// Condensed match info returned after a manual search
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchSummary {
    /// Deezer track id
    pub id: i64,
    /// Track title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Canonical Deezer track URL
    pub link: String,
}

/// Response body for a manual track search
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    /// The new match, absent when the search found nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deezer_match: Option<MatchSummary>,
    /// The recomputed confidence score
    pub confidence: u8,
}

/// POST /api/session/{id}/track/{index}/search - Manually re-match a track
#[utoipa::path(
    post,
    path = "/api/session/{id}/track/{index}/search",
    tag = "tracks",
    params(
        ("id" = String, Path, description = "Session id"),
        ("index" = usize, Path, description = "Track index"),
    ),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Track re-matched", body = SearchResponse),
        (status = 400, description = "Session is not ready or query missing", body = ApiError),
        (status = 404, description = "Session or track not found", body = ApiError),
        (status = 502, description = "Downloader search failed", body = ApiError)
    )
)]
pub async fn search_track(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
    Json(req): Json<SearchRequest>,
) -> Response {
    if req.query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("query is required")),
        )
            .into_response();
    }

    if let Err(e) = state.pipeline.search_track(&id, index, &req.query).await {
        return error_response(&e);
    }

    // Report the updated match from a fresh snapshot.
    let Some(session) = state.pipeline.get_session(&id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiError::new("session_not_found", format!("session {id} not found"))),
        )
            .into_response();
    };
    let track = &session.tracks[index];

    Json(SearchResponse {
        deezer_match: track.deezer_match.as_ref().map(|m| MatchSummary {
            id: m.id,
            title: m.title.clone(),
            artist: m.artist.clone(),
            link: m.link.clone(),
        }),
        confidence: track.confidence,
    })
    .into_response()
}
