//! OpenAPI documentation for the REST API.

use utoipa::OpenApi;

use super::routes;
use crate::deemix::SearchResult;
use crate::error::{ApiError, ErrorDetail};
use crate::types::{Progress, Session, SessionStatus, Track, TrackStatus};
use crate::ytdlp::ChannelPlaylist;

/// The OpenAPI document for the deemix-sync REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "deemix-sync API",
        description = "Analyze YouTube playlists and queue matching tracks on a Deemix instance",
        license(name = "MIT")
    ),
    paths(
        routes::analyze,
        routes::get_session,
        routes::download_session,
        routes::pause_session,
        routes::resume_session,
        routes::cancel_session,
        routes::select_track,
        routes::search_track,
        routes::channel_playlists,
        routes::url_info,
        routes::stats,
        routes::navidrome_status,
    ),
    components(schemas(
        Session,
        Track,
        Progress,
        SessionStatus,
        TrackStatus,
        SearchResult,
        ChannelPlaylist,
        ApiError,
        ErrorDetail,
        routes::AnalyzeRequest,
        routes::AnalyzeResponse,
        routes::SelectRequest,
        routes::SelectResponse,
        routes::SearchRequest,
        routes::SearchResponse,
        routes::MatchSummary,
        routes::ChannelPlaylistsResponse,
        routes::UrlInfoResponse,
        routes::StatsResponse,
        routes::NavidromeStatusResponse,
    )),
    tags(
        (name = "sessions", description = "Analysis and download session lifecycle"),
        (name = "tracks", description = "Per-track selection and manual re-matching"),
        (name = "channel", description = "Channel browsing and URL previews"),
        (name = "system", description = "Process and integration status"),
    )
)]
pub struct ApiDoc;
