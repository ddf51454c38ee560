//! Route handlers, organized by domain.

mod channel;
mod sessions;
mod system;
mod tracks;

pub use channel::*;
pub use sessions::*;
pub use system::*;
pub use tracks::*;

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Map an engine error onto its HTTP status and JSON envelope.
pub(crate) fn error_response(error: &Error) -> Response {
    let status = StatusCode::from_u16(error.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiError::from(error))).into_response()
}

/// Whether the URL plausibly points at YouTube content.
pub(crate) fn is_valid_youtube_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// Whether the URL plausibly points at a YouTube channel.
pub(crate) fn is_channel_url(url: &str) -> bool {
    url.contains("youtube.com/@")
        || url.contains("youtube.com/channel/")
        || url.contains("youtube.com/c/")
        || url.contains("youtube.com/user/")
        || url.contains("youtube.com/browse/")
}
