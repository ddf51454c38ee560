//! Mock adapters and helpers shared by the engine tests.

use crate::deemix::{DeemixClient, SearchResult};
use crate::error::{Error, Result};
use crate::navidrome::{LibraryEntry, NavidromeClient};
use crate::pipeline::Pipeline;
use crate::types::{Session, SessionStatus};
use crate::ytdlp::{ChannelPlaylist, Fetcher, PlaylistEntry};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A flat playlist entry with only a title, like a regular YouTube upload.
pub(crate) fn entry(title: &str) -> PlaylistEntry {
    PlaylistEntry {
        title: title.to_string(),
        ..Default::default()
    }
}

/// A Deezer search result with the canonical link for `id`.
pub(crate) fn deezer_track(id: i64, artist: &str, title: &str) -> SearchResult {
    SearchResult {
        id,
        title: title.to_string(),
        artist: artist.to_string(),
        album: String::new(),
        duration: 0,
        link: format!("https://www.deezer.com/track/{id}"),
    }
}

/// Fetcher returning a fixed entry list or a fixed error.
#[derive(Default)]
pub(crate) struct MockFetcher {
    pub(crate) entries: Vec<PlaylistEntry>,
    pub(crate) error: Option<String>,
    pub(crate) delay: Duration,
}

impl MockFetcher {
    pub(crate) fn with_entries(titles: &[&str]) -> Self {
        Self {
            entries: titles.iter().map(|t| entry(t)).collect(),
            ..Default::default()
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get_playlist(&self, _url: &str) -> Result<Vec<PlaylistEntry>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.error {
            Some(message) => Err(Error::Fetch(message.clone())),
            None => Ok(self.entries.clone()),
        }
    }

    async fn get_channel_playlists(&self, _url: &str) -> Result<Vec<ChannelPlaylist>> {
        Ok(Vec::new())
    }

    async fn get_url_info(&self, _url: &str) -> Result<String> {
        Ok(String::new())
    }
}

/// Deemix client answering from a query -> results table.
#[derive(Default)]
pub(crate) struct MockDeemix {
    results: Mutex<HashMap<String, Vec<SearchResult>>>,
    queue_failures: Mutex<HashSet<String>>,
    pub(crate) search_delay: Duration,
    pub(crate) search_calls: Mutex<Vec<String>>,
    pub(crate) queue_calls: Mutex<Vec<(String, u32)>>,
}

impl MockDeemix {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.search_delay = delay;
        self
    }

    /// Register the results returned for an exact query string.
    pub(crate) fn set_results(&self, query: &str, results: Vec<SearchResult>) {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), results);
    }

    /// Make `add_to_queue` fail for a specific link.
    pub(crate) fn fail_queue_for(&self, link: &str) {
        self.queue_failures.lock().unwrap().insert(link.to_string());
    }

    pub(crate) fn queued_links(&self) -> Vec<String> {
        self.queue_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(link, _)| link.clone())
            .collect()
    }
}

#[async_trait]
impl DeemixClient for MockDeemix {
    async fn login(&self) -> Result<()> {
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.search_calls.lock().unwrap().push(query.to_string());
        if !self.search_delay.is_zero() {
            tokio::time::sleep(self.search_delay).await;
        }
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_to_queue(&self, deezer_url: &str, bitrate: u32) -> Result<()> {
        self.queue_calls
            .lock()
            .unwrap()
            .push((deezer_url.to_string(), bitrate));
        if self.queue_failures.lock().unwrap().contains(deezer_url) {
            return Err(Error::Queue("mock queue failure".into()));
        }
        Ok(())
    }
}

/// Library client answering from a fixed (artist, title) hit set.
#[derive(Default)]
pub(crate) struct MockNavidrome {
    pub(crate) hits: Mutex<HashSet<(String, String)>>,
    pub(crate) fail: bool,
    pub(crate) calls: Mutex<Vec<(String, String)>>,
}

impl MockNavidrome {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a library hit for an artist/title pair (case-insensitive).
    pub(crate) fn add_hit(&self, artist: &str, title: &str) {
        self.hits
            .lock()
            .unwrap()
            .insert((artist.to_lowercase(), title.to_lowercase()));
    }
}

#[async_trait]
impl NavidromeClient for MockNavidrome {
    async fn search(&self, artist: &str, title: &str) -> Result<Vec<LibraryEntry>> {
        self.calls
            .lock()
            .unwrap()
            .push((artist.to_string(), title.to_string()));
        if self.fail {
            return Err(Error::Library("mock library failure".into()));
        }
        let key = (artist.to_lowercase(), title.to_lowercase());
        if self.hits.lock().unwrap().contains(&key) {
            Ok(vec![LibraryEntry {
                id: "lib-1".into(),
                title: title.to_string(),
                artist: artist.to_string(),
                album: String::new(),
                duration: 0,
            }])
        } else {
            Ok(Vec::new())
        }
    }
}

/// A pipeline with zero delays, suitable for fast deterministic tests.
pub(crate) fn test_pipeline(
    fetcher: Arc<MockFetcher>,
    deemix: Arc<MockDeemix>,
    navidrome: Option<Arc<MockNavidrome>>,
) -> Pipeline {
    Pipeline::new(
        fetcher,
        deemix,
        navidrome.map(|n| n as Arc<dyn NavidromeClient>),
    )
    .with_delays(Duration::ZERO, Duration::ZERO, Duration::ZERO)
}

/// Poll until the session reaches `status`, panicking on timeout or on an
/// unexpected terminal state.
pub(crate) async fn wait_for_status(
    pipeline: &Pipeline,
    session_id: &str,
    status: SessionStatus,
) -> Session {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(session) = pipeline.get_session(session_id).await {
            if session.status == status {
                return session;
            }
            if session.status.is_terminal() {
                panic!(
                    "session {session_id} reached terminal status {} (error: {:?}) while waiting for {status}",
                    session.status, session.error
                );
            }
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for session {session_id} to reach {status}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Assert the counter invariants that must hold for any snapshot.
pub(crate) fn assert_progress_invariants(session: &Session) {
    let selected_tracks = session.tracks.iter().filter(|t| t.selected).count();
    assert_eq!(
        session.progress.selected, selected_tracks,
        "progress.selected must equal the number of selected tracks"
    );

    // Tracks in found/queued/error had a match; together with the
    // categorised counters they account for every searched track.
    let found_like = session
        .tracks
        .iter()
        .filter(|t| {
            matches!(
                t.status,
                crate::types::TrackStatus::Found
                    | crate::types::TrackStatus::Queued
                    | crate::types::TrackStatus::Error
            )
        })
        .count();
    assert_eq!(
        session.progress.searched,
        found_like
            + session.progress.not_found
            + session.progress.needs_review
            + session.progress.skipped,
        "searched must equal found-like + not_found + needs_review + skipped"
    );
}
