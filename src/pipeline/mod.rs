//! Sync session engine
//!
//! The `Pipeline` owns every session and drives them through their phases:
//!
//! ```text
//! analyze() -> fetching -> parsing -> searching -> (checking) -> ready
//!                                                                 |
//!                                              download() -> downloading -> done
//! ```
//!
//! Organized by concern:
//! - [`analysis`] - the analyze entry point and the analysis worker
//! - [`download`] - the download worker and manual track re-search
//! - [`control`] - pause/resume/cancel and the worker checkpoint
//! - [`confidence`] - match confidence scoring
//!
//! One reader/writer lock guards the sessions map, the controls map and
//! every field inside every session. Workers take the write lock per
//! mutation and release it across adapter I/O; readers receive snapshot
//! copies and never iterate live state.

mod analysis;
pub(crate) mod confidence;
mod control;
mod download;

pub use confidence::calculate_confidence;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::deemix::DeemixClient;
use crate::error::{Error, Result};
use crate::navidrome::NavidromeClient;
use crate::types::{Progress, Session, SessionStatus, TrackStatus};
use crate::ytdlp::Fetcher;
use control::SessionControl;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Default confidence threshold (0-100) for auto-selecting a match.
pub const DEFAULT_CONFIDENCE_THRESHOLD: u8 = 70;

const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_QUEUE_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_CHECK_DELAY: Duration = Duration::from_millis(100);

/// Sessions and their phase controls, guarded together by one lock
#[derive(Default)]
pub(crate) struct PipelineState {
    pub(crate) sessions: HashMap<String, Session>,
    pub(crate) controls: HashMap<String, SessionControl>,
}

/// The sync session engine (cloneable; shared state is Arc-wrapped)
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) deemix: Arc<dyn DeemixClient>,
    pub(crate) navidrome: Option<Arc<dyn NavidromeClient>>,
    pub(crate) state: Arc<RwLock<PipelineState>>,
    pub(crate) search_delay: Duration,
    pub(crate) queue_delay: Duration,
    pub(crate) check_delay: Duration,
    pub(crate) confidence_threshold: u8,
}

impl Pipeline {
    /// Create a new pipeline with the given adapters.
    ///
    /// Pass `None` for `navidrome` to disable library checking.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        deemix: Arc<dyn DeemixClient>,
        navidrome: Option<Arc<dyn NavidromeClient>>,
    ) -> Self {
        Self {
            fetcher,
            deemix,
            navidrome,
            state: Arc::new(RwLock::new(PipelineState::default())),
            search_delay: DEFAULT_SEARCH_DELAY,
            queue_delay: DEFAULT_QUEUE_DELAY,
            check_delay: DEFAULT_CHECK_DELAY,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Set the minimum confidence score (0-100) for auto-selecting a match.
    ///
    /// Tracks below the threshold are marked `needs_review`. Out-of-range
    /// values are clamped.
    pub fn with_confidence_threshold(mut self, threshold: i64) -> Self {
        self.confidence_threshold = threshold.clamp(0, 100) as u8;
        self
    }

    /// Override the inter-iteration delays (search, queue, library check).
    ///
    /// The defaults keep request rates polite toward the external services;
    /// tests set these to zero.
    pub fn with_delays(mut self, search: Duration, queue: Duration, check: Duration) -> Self {
        self.search_delay = search;
        self.queue_delay = queue;
        self.check_delay = check;
        self
    }

    /// Return a snapshot copy of a session.
    ///
    /// The tracks sequence is copied element-wise so callers can iterate
    /// without holding the engine's lock.
    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        let state = self.state.read().await;
        state.sessions.get(session_id).cloned()
    }

    /// Number of sessions currently held by the engine.
    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Toggle the selection state of a track.
    ///
    /// Valid only while the session is `ready`. Idempotent when the value
    /// is unchanged.
    pub async fn set_track_selected(
        &self,
        session_id: &str,
        track_index: usize,
        selected: bool,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        if session.status != SessionStatus::Ready {
            return Err(Error::SessionNotReady {
                id: session_id.to_string(),
                status: session.status,
            });
        }
        let len = session.tracks.len();
        let track = session
            .tracks
            .get_mut(track_index)
            .ok_or(Error::TrackOutOfRange {
                index: track_index,
                len,
            })?;

        if track.selected == selected {
            return Ok(());
        }

        track.selected = selected;
        if selected {
            session.progress.selected += 1;
        } else {
            session.progress.selected -= 1;
        }

        tracing::info!(
            session_id = %session_id,
            track = track_index,
            selected = selected,
            "track selection changed"
        );
        Ok(())
    }

    /// Set a session's status unless it already reached a terminal state.
    pub(crate) async fn set_status_if_running(&self, session_id: &str, status: SessionStatus) {
        let mut state = self.state.write().await;
        if let Some(session) = state.sessions.get_mut(session_id) {
            if !session.status.is_terminal() {
                session.status = status;
            }
        }
    }

    /// Mark a session failed with an error message.
    pub(crate) async fn set_session_error(&self, session_id: &str, message: &str) {
        let mut state = self.state.write().await;
        if let Some(session) = state.sessions.get_mut(session_id) {
            if !session.status.is_terminal() {
                session.status = SessionStatus::Error;
                session.error = message.to_string();
            }
        }
        tracing::error!(session_id = %session_id, error = %message, "session failed");
    }

    /// Mark a session canceled after its worker observed the signal.
    ///
    /// Usually a no-op: `cancel_session` already published the status.
    pub(crate) async fn finish_canceled(&self, session_id: &str) {
        self.set_status_if_running(session_id, SessionStatus::Canceled)
            .await;
        tracing::info!(session_id = %session_id, "worker stopped after cancellation");
    }
}

/// Build the downloader search query for a parsed artist/song pair.
pub(crate) fn build_query(artist: &str, song: &str) -> String {
    if artist.is_empty() {
        song.to_string()
    } else {
        format!("{artist} {song}")
    }
}

/// Generate a session identifier: 8 random bytes as lowercase hex.
pub(crate) fn generate_session_id() -> String {
    let bytes: [u8; 8] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Adjust counters when a track moves between categorised states.
///
/// Decrements the counter shadowing the state being left, increments the
/// one being entered, and drops the `selected` count when the track was
/// selected. Callers increment `selected` themselves when the new state
/// selects the track. Must run under the engine's write lock.
pub(crate) fn update_progress_for_status_change(
    progress: &mut Progress,
    old_status: TrackStatus,
    new_status: TrackStatus,
    was_selected: bool,
) {
    match old_status {
        TrackStatus::NotFound => progress.not_found -= 1,
        TrackStatus::NeedsReview => progress.needs_review -= 1,
        TrackStatus::Skipped => progress.skipped -= 1,
        _ => {}
    }
    if was_selected {
        progress.selected -= 1;
    }
    match new_status {
        TrackStatus::NotFound => progress.not_found += 1,
        TrackStatus::NeedsReview => progress.needs_review += 1,
        TrackStatus::Skipped => progress.skipped += 1,
        _ => {}
    }
}
