//! Deemix downloader service client
//!
//! Deemix exposes a small HTTP API: ARL login, Deezer track search and a
//! download queue. The pipeline only ever takes the top search result and
//! enqueues tracks by their canonical Deezer URL.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Bitrate code for FLAC quality
pub const BITRATE_FLAC: u32 = 9;
/// Bitrate code for MP3 320 kbps
pub const BITRATE_320: u32 = 3;
/// Bitrate code for MP3 128 kbps
pub const BITRATE_128: u32 = 1;

/// A track found on Deezer via Deemix
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    /// Deezer track id
    pub id: i64,
    /// Track title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Album title
    pub album: String,
    /// Duration in seconds
    pub duration: i64,
    /// Canonical Deezer track URL
    pub link: String,
}

/// Interface for interacting with Deemix
#[async_trait]
pub trait DeemixClient: Send + Sync {
    /// Authenticate with the Deemix instance using the configured ARL token.
    async fn login(&self) -> Result<()>;

    /// Search Deezer for tracks matching the query. Returns at most 5
    /// results.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Add a track to the Deemix download queue.
    async fn add_to_queue(&self, deezer_url: &str, bitrate: u32) -> Result<()>;
}

/// [`DeemixClient`] implementation using Deemix's HTTP API
pub struct HttpDeemixClient {
    base_url: String,
    arl: String,
    client: reqwest::Client,
}

impl HttpDeemixClient {
    /// Create a new client for the Deemix instance at `base_url`.
    ///
    /// Deemix tracks the login in a session cookie, so the underlying HTTP
    /// client keeps a cookie store.
    pub fn new(base_url: impl Into<String>, arl: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            base_url: base_url.into(),
            arl: arl.into(),
            client,
        })
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    status: i64,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<RawTrack>,
}

#[derive(Deserialize)]
struct RawTrack {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: RawArtist,
    #[serde(default)]
    album: RawAlbum,
    #[serde(default)]
    duration: i64,
    #[serde(default)]
    link: String,
}

#[derive(Default, Deserialize)]
struct RawArtist {
    #[serde(default)]
    name: String,
}

#[derive(Default, Deserialize)]
struct RawAlbum {
    #[serde(default)]
    title: String,
}

impl From<RawTrack> for SearchResult {
    fn from(raw: RawTrack) -> Self {
        // Deemix sometimes omits the link; synthesize the canonical URL.
        let link = if raw.link.is_empty() {
            format!("https://www.deezer.com/track/{}", raw.id)
        } else {
            raw.link
        };
        SearchResult {
            id: raw.id,
            title: raw.title,
            artist: raw.artist.name,
            album: raw.album.title,
            duration: raw.duration,
            link,
        }
    }
}

#[async_trait]
impl DeemixClient for HttpDeemixClient {
    async fn login(&self) -> Result<()> {
        tracing::info!(base_url = %self.base_url, "logging in to Deemix");
        let resp = self
            .client
            .post(format!("{}/api/loginArl", self.base_url))
            .json(&serde_json::json!({ "arl": self.arl }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deemix login failed");
            return Err(Error::Auth(format!("login failed (status {status}): {body}")));
        }

        let login: LoginResponse = resp.json().await?;
        if login.status == 0 {
            tracing::error!("Deemix login failed: invalid ARL token");
            return Err(Error::Auth("invalid ARL token".into()));
        }

        tracing::info!("Deemix login successful");
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        tracing::debug!(query = %query, "searching Deemix");
        let resp = self
            .client
            .get(format!("{}/api/search", self.base_url))
            .query(&[("term", query), ("type", "track"), ("nb", "5")])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::warn!(status = %status, query = %query, "Deemix search failed");
            return Err(Error::Search(format!("search failed (status {status})")));
        }

        let body: SearchResponse = resp.json().await?;
        let results: Vec<SearchResult> = body.data.into_iter().map(SearchResult::from).collect();

        tracing::debug!(query = %query, results = results.len(), "Deemix search complete");
        Ok(results)
    }

    async fn add_to_queue(&self, deezer_url: &str, bitrate: u32) -> Result<()> {
        tracing::debug!(url = %deezer_url, bitrate = bitrate, "adding to Deemix queue");
        let resp = self
            .client
            .post(format!("{}/api/addToQueue", self.base_url))
            .json(&serde_json::json!({ "url": deezer_url, "bitrate": bitrate }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, url = %deezer_url, body = %body, "Deemix queue failed");
            return Err(Error::Queue(format!("queue failed (status {status}): {body}")));
        }

        tracing::debug!(url = %deezer_url, "queued successfully");
        Ok(())
    }
}
