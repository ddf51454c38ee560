//! Error types for deemix-sync
//!
//! This module provides error handling for the library, including:
//! - Session lifecycle errors (not found, wrong state, terminal)
//! - Adapter errors (fetch, search, queue, library check)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use crate::types::SessionStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for deemix-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for deemix-sync
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Session id is absent from the sessions map
    #[error("session {0} not found")]
    SessionNotFound(String),

    /// Operation requires the session to be in the ready state
    #[error("session {id} is not ready (status: {status})")]
    SessionNotReady {
        /// The session the operation targeted
        id: String,
        /// The status the session was actually in
        status: SessionStatus,
    },

    /// Resume requested but the session is not paused
    #[error("session {id} is not paused (status: {status})")]
    SessionNotPaused {
        /// The session the operation targeted
        id: String,
        /// The status the session was actually in
        status: SessionStatus,
    },

    /// Pause requested but the session is already paused
    #[error("session {0} is already paused")]
    SessionAlreadyPaused(String),

    /// Pause requested but the session is not in an active phase
    #[error("session {id} is not in an active state (status: {status})")]
    SessionNotActive {
        /// The session the operation targeted
        id: String,
        /// The status the session was actually in
        status: SessionStatus,
    },

    /// Cancel requested but the session already reached a terminal status
    #[error("session {id} is already in a terminal state ({status})")]
    SessionTerminal {
        /// The session the operation targeted
        id: String,
        /// The terminal status the session is in
        status: SessionStatus,
    },

    /// Track index is outside the session's track list
    #[error("track index {index} out of range (session has {len} tracks)")]
    TrackOutOfRange {
        /// The requested track index
        index: usize,
        /// The number of tracks in the session
        len: usize,
    },

    /// Playlist metadata extraction failed and yielded no entries
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Downloader search request failed
    #[error("search failed: {0}")]
    Search(String),

    /// Downloader queue request failed
    #[error("queue failed: {0}")]
    Queue(String),

    /// Library existence check failed
    #[error("library check failed: {0}")]
    Library(String),

    /// Downloader rejected the configured credential
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The session's cancellation signal was observed
    #[error("canceled")]
    Canceled,

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "DEEMIX_ARL")
        key: Option<String>,
    },

    /// External tool execution failed (yt-dlp)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServer(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes and
/// human-readable messages.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "session_not_found",
///     "message": "session ab12cd34ef56ab12 not found"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "session_not_found")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    ///
    /// This is suitable for displaying to end users.
    pub message: String,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 404 Not Found
            Error::SessionNotFound(_) => 404,
            Error::TrackOutOfRange { .. } => 404,

            // 400 Bad Request - state conflicts and invalid input
            Error::SessionNotReady { .. } => 400,
            Error::SessionNotPaused { .. } => 400,
            Error::SessionAlreadyPaused(_) => 400,
            Error::SessionNotActive { .. } => 400,
            Error::SessionTerminal { .. } => 400,
            Error::Config { .. } => 400,

            // 409 Conflict - the operation raced a cancellation
            Error::Canceled => 409,

            // 502 Bad Gateway - external collaborator errors
            Error::Fetch(_) => 502,
            Error::Search(_) => 502,
            Error::Queue(_) => 502,
            Error::Library(_) => 502,
            Error::Auth(_) => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable - missing external tooling
            Error::ExternalTool(_) => 503,

            // 500 Internal Server Error
            Error::Serialization(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServer(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::SessionNotFound(_) => "session_not_found",
            Error::SessionNotReady { .. } => "session_not_ready",
            Error::SessionNotPaused { .. } => "session_not_paused",
            Error::SessionAlreadyPaused(_) => "session_already_paused",
            Error::SessionNotActive { .. } => "session_not_active",
            Error::SessionTerminal { .. } => "session_terminal",
            Error::TrackOutOfRange { .. } => "track_out_of_range",
            Error::Fetch(_) => "fetch_failed",
            Error::Search(_) => "search_failed",
            Error::Queue(_) => "queue_failed",
            Error::Library(_) => "library_failed",
            Error::Auth(_) => "auth_failed",
            Error::Canceled => "canceled",
            Error::Config { .. } => "config_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::ApiServer(_) => "api_server_error",
        }
    }
}

impl From<&Error> for ApiError {
    fn from(error: &Error) -> Self {
        ApiError::new(error.error_code(), error.to_string())
    }
}
