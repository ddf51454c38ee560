//! Core session types for deemix-sync

use crate::deemix::SearchResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a sync session
///
/// The wire representation is the lowercase snake_case name; the frontend
/// switches on these exact strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Resolving playlist metadata via the fetcher
    Fetching,
    /// Splitting video titles into artist/song pairs
    Parsing,
    /// Searching the downloader for each track
    Searching,
    /// Checking the library for already-owned tracks
    Checking,
    /// Analysis complete, waiting for the user to trigger a download
    Ready,
    /// Enqueuing selected tracks on the downloader
    Downloading,
    /// Suspended by the user; resumes into the interrupted phase
    Paused,
    /// Download phase completed
    Done,
    /// Canceled by the user
    Canceled,
    /// Failed with an unrecoverable error
    Error,
}

impl SessionStatus {
    /// Whether the status is terminal. Once reached it never changes again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Done | SessionStatus::Canceled | SessionStatus::Error
        )
    }

    /// Whether a worker task is actively driving the session through a phase.
    ///
    /// `Paused` is a wait state layered over an active phase and is not
    /// itself active; `Ready` waits on external input.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionStatus::Fetching
                | SessionStatus::Parsing
                | SessionStatus::Searching
                | SessionStatus::Checking
                | SessionStatus::Downloading
        )
    }

    /// The wire string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Fetching => "fetching",
            SessionStatus::Parsing => "parsing",
            SessionStatus::Searching => "searching",
            SessionStatus::Checking => "checking",
            SessionStatus::Ready => "ready",
            SessionStatus::Downloading => "downloading",
            SessionStatus::Paused => "paused",
            SessionStatus::Done => "done",
            SessionStatus::Canceled => "canceled",
            SessionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single track within a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    /// Parsed but not yet searched
    Pending,
    /// Search in flight
    Searching,
    /// Matched with confidence at or above the threshold
    Found,
    /// Matched below the threshold; needs manual review
    NeedsReview,
    /// No search result
    NotFound,
    /// Already present in the library
    Skipped,
    /// Successfully handed to the downloader's queue
    Queued,
    /// Queue request failed
    Error,
}

impl TrackStatus {
    /// The wire string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            TrackStatus::Pending => "pending",
            TrackStatus::Searching => "searching",
            TrackStatus::Found => "found",
            TrackStatus::NeedsReview => "needs_review",
            TrackStatus::NotFound => "not_found",
            TrackStatus::Skipped => "skipped",
            TrackStatus::Queued => "queued",
            TrackStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single video being processed through the pipeline
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Track {
    /// The original video title as returned by the fetcher
    pub youtube_title: String,
    /// Artist extracted from the title (may be empty)
    pub parsed_artist: String,
    /// Song name extracted from the title
    pub parsed_song: String,
    /// Top search result chosen as the candidate match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deezer_match: Option<SearchResult>,
    /// Confidence score (0-100) for the match
    pub confidence: u8,
    /// Current track status
    pub status: TrackStatus,
    /// Whether the track will be queued by the download phase
    pub selected: bool,
}

impl Track {
    /// Create a pending track from a title and its parsed artist/song pair.
    pub fn pending(youtube_title: String, parsed_artist: String, parsed_song: String) -> Self {
        Self {
            youtube_title,
            parsed_artist,
            parsed_song,
            deezer_match: None,
            confidence: 0,
            status: TrackStatus::Pending,
            selected: false,
        }
    }
}

/// Aggregate counters for a session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Progress {
    /// Total number of tracks in the session
    pub total: usize,
    /// Tracks that have completed the search step
    pub searched: usize,
    /// Tracks currently marked for download
    pub selected: usize,
    /// Tracks successfully handed to the downloader's queue
    pub queued: usize,
    /// Tracks with no search result
    pub not_found: usize,
    /// Tracks matched below the confidence threshold
    pub needs_review: usize,
    /// Tracks skipped because the library already has them
    pub skipped: usize,
}

/// A single sync operation from a YouTube playlist
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Session {
    /// Session identifier (16 lowercase hex characters)
    pub id: String,
    /// The source playlist/video URL
    pub url: String,
    /// Current session status
    pub status: SessionStatus,
    /// Error message when status is `error`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    /// Tracks resolved from the playlist, in playlist order
    pub tracks: Vec<Track>,
    /// Aggregate progress counters
    pub progress: Progress,
    /// Bitrate code passed to the downloader's queue
    pub bitrate: u32,
    /// Whether the library check phase was requested
    pub check_navidrome: bool,
}

impl Session {
    /// Create a fresh session in the `fetching` state.
    pub fn new(id: String, url: String, bitrate: u32, check_navidrome: bool) -> Self {
        Self {
            id,
            url,
            status: SessionStatus::Fetching,
            error: String::new(),
            tracks: Vec::new(),
            progress: Progress::default(),
            bitrate,
            check_navidrome,
        }
    }
}
