//! Navidrome library existence checks
//!
//! Uses the Subsonic-compatible `search2` endpoint to decide whether a
//! matched track already exists in the user's library, so it can be skipped
//! instead of downloaded again.

mod match_mode;

pub use match_mode::MatchMode;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// A song found in the library
#[derive(Clone, Debug)]
pub struct LibraryEntry {
    /// Library song id
    pub id: String,
    /// Song title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Album title
    pub album: String,
    /// Duration in seconds
    pub duration: i64,
}

/// Interface for checking track existence in a music library
#[async_trait]
pub trait NavidromeClient: Send + Sync {
    /// Search the library for songs matching the artist/title pair.
    ///
    /// Results are already filtered by the configured [`MatchMode`]; any
    /// non-empty result means the track is considered owned.
    async fn search(&self, artist: &str, title: &str) -> Result<Vec<LibraryEntry>>;
}

/// [`NavidromeClient`] implementation using the Subsonic REST API
pub struct HttpNavidromeClient {
    base_url: String,
    user: String,
    password: String,
    match_mode: MatchMode,
    client: reqwest::Client,
}

impl HttpNavidromeClient {
    /// Create a client for the Navidrome instance at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        match_mode: MatchMode,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            user: user.into(),
            password: password.into(),
            match_mode,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct SubsonicEnvelope {
    #[serde(rename = "subsonic-response")]
    subsonic_response: SubsonicResponse,
}

#[derive(Deserialize)]
struct SubsonicResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<SubsonicError>,
    #[serde(rename = "searchResult2", default)]
    search_result2: SearchResult2,
}

#[derive(Deserialize)]
struct SubsonicError {
    #[serde(default)]
    message: String,
}

#[derive(Default, Deserialize)]
struct SearchResult2 {
    #[serde(default)]
    song: Vec<SubsonicSong>,
}

#[derive(Deserialize)]
struct SubsonicSong {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    album: String,
    #[serde(default)]
    duration: i64,
}

#[async_trait]
impl NavidromeClient for HttpNavidromeClient {
    async fn search(&self, artist: &str, title: &str) -> Result<Vec<LibraryEntry>> {
        let query = format!("{artist} {title}");
        let url = format!("{}/rest/search2", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(url)
            .query(&[
                ("query", query.as_str()),
                ("songCount", "5"),
                ("f", "json"),
                ("v", "1.16.1"),
                ("c", "deemix-sync"),
                ("u", self.user.as_str()),
                ("p", self.password.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::warn!(status = %status, "Navidrome returned unexpected status");
            return Err(Error::Library(format!("unexpected status {status}")));
        }

        let envelope: SubsonicEnvelope = resp.json().await?;
        let body = envelope.subsonic_response;
        if body.status != "ok" {
            let msg = body
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            tracing::warn!(error = %msg, "Navidrome API error");
            return Err(Error::Library(msg));
        }

        // search2 matches loosely; keep only songs the configured mode
        // accepts.
        let results = body
            .search_result2
            .song
            .into_iter()
            .filter(|song| {
                match_mode::matches_song(self.match_mode, &song.artist, &song.title, artist, title)
            })
            .map(|song| LibraryEntry {
                id: song.id,
                title: song.title,
                artist: song.artist,
                album: song.album,
                duration: song.duration,
            })
            .collect();

        Ok(results)
    }
}
