//! Channel browsing and URL preview handlers.

use super::{is_channel_url, is_valid_youtube_url};
use crate::api::AppState;
use crate::error::ApiError;
use crate::ytdlp::ChannelPlaylist;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Query parameters carrying a target URL
#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    /// The YouTube URL to inspect
    #[serde(default)]
    pub url: String,
}

/// Response body listing a channel's playlists
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelPlaylistsResponse {
    /// The playlists found on the channel
    pub playlists: Vec<ChannelPlaylist>,
}

/// GET /api/channel/playlists - List all playlists on a channel
#[utoipa::path(
    get,
    path = "/api/channel/playlists",
    tag = "channel",
    params(("url" = String, Query, description = "YouTube channel URL")),
    responses(
        (status = 200, description = "Playlists on the channel", body = ChannelPlaylistsResponse),
        (status = 400, description = "Missing or invalid channel URL", body = ApiError),
        (status = 502, description = "Channel fetch failed", body = ApiError)
    )
)]
pub async fn channel_playlists(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Response {
    if query.url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("url query parameter is required")),
        )
            .into_response();
    }
    if !is_channel_url(&query.url) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("invalid YouTube channel URL")),
        )
            .into_response();
    }

    match state.fetcher.get_channel_playlists(&query.url).await {
        Ok(playlists) => {
            tracing::info!(url = %query.url, playlists = playlists.len(), "fetched channel playlists");
            Json(ChannelPlaylistsResponse { playlists }).into_response()
        }
        Err(e) => {
            tracing::error!(url = %query.url, error = %e, "failed to fetch channel playlists");
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiError::new(
                    "fetch_failed",
                    "failed to fetch channel playlists",
                )),
            )
                .into_response()
        }
    }
}

/// Response body for a URL preview
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UrlInfoResponse {
    /// The URL that was inspected
    pub url: String,
    /// The resolved title; empty when resolution failed
    pub title: String,
}

/// GET /api/url/info - Resolve a URL's title for preview
#[utoipa::path(
    get,
    path = "/api/url/info",
    tag = "channel",
    params(("url" = String, Query, description = "YouTube URL")),
    responses(
        (status = 200, description = "Resolved title (empty on fetch failure)", body = UrlInfoResponse),
        (status = 400, description = "Missing or invalid URL", body = ApiError)
    )
)]
pub async fn url_info(State(state): State<AppState>, Query(query): Query<UrlQuery>) -> Response {
    if query.url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("url query parameter is required")),
        )
            .into_response();
    }
    if !is_valid_youtube_url(&query.url) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("invalid YouTube URL")),
        )
            .into_response();
    }

    match state.fetcher.get_url_info(&query.url).await {
        Ok(title) => Json(UrlInfoResponse {
            url: query.url,
            title,
        })
        .into_response(),
        Err(e) => {
            // Degrade to an empty title; the frontend falls back to the URL.
            tracing::warn!(url = %query.url, error = %e, "failed to fetch URL info");
            Json(UrlInfoResponse {
                url: query.url,
                title: String::new(),
            })
            .into_response()
        }
    }
}
