//! YouTube metadata extraction via yt-dlp
//!
//! The fetcher resolves a playlist, single-video or channel URL into
//! structured entries by invoking the external `yt-dlp` binary and parsing
//! its newline-delimited JSON output.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::process::Command;
use utoipa::ToSchema;

/// A single video resolved from a playlist
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlaylistEntry {
    /// The video title
    #[serde(default)]
    pub title: String,
    /// The video identifier
    #[serde(rename = "id", default)]
    pub video_id: String,
    /// The video URL
    #[serde(default)]
    pub url: String,
    /// Structured artist, present for YouTube Music content
    #[serde(default)]
    pub artist: Option<String>,
    /// Structured track name, present for YouTube Music content
    #[serde(default)]
    pub track: Option<String>,
    /// Uploading channel name (unreliable as an artist signal)
    #[serde(default)]
    pub channel: Option<String>,
}

/// A playlist found on a YouTube channel
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelPlaylist {
    /// The playlist identifier
    pub id: String,
    /// The playlist title
    pub title: String,
    /// The playlist URL
    pub url: String,
}

/// Interface for fetching YouTube playlist data
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch all video entries from a playlist, single-video or
    /// YouTube Music URL, in playlist order.
    async fn get_playlist(&self, url: &str) -> Result<Vec<PlaylistEntry>>;

    /// Fetch all playlists published on a channel.
    async fn get_channel_playlists(&self, url: &str) -> Result<Vec<ChannelPlaylist>>;

    /// Fetch the title for a URL, used for UI previews.
    async fn get_url_info(&self, url: &str) -> Result<String>;
}

/// [`Fetcher`] implementation that calls the yt-dlp binary
pub struct CommandFetcher {
    binary_path: PathBuf,
}

impl CommandFetcher {
    /// Create a fetcher with an explicit binary path.
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find yt-dlp in PATH.
    ///
    /// Returns `None` when the binary is not installed.
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Run yt-dlp with the given arguments, capturing output.
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(&self.binary_path)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to execute yt-dlp: {e}")))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        })
    }

    /// Run a dump-json invocation and parse its entries.
    ///
    /// yt-dlp regularly exits non-zero after emitting valid entries (one
    /// private video fails the whole run); the result is an error only when
    /// nothing at all parsed.
    async fn fetch_entries(&self, args: &[&str], url: &str) -> Result<Vec<PlaylistEntry>> {
        let output = self.run(args).await?;
        let entries = parse_entries(&output.stdout);

        if entries.is_empty() && !output.success {
            tracing::error!(url = %url, stderr = %output.stderr.trim(), "yt-dlp failed");
            return Err(Error::Fetch(format!(
                "yt-dlp failed: {}",
                output.stderr.trim()
            )));
        }
        if !output.success {
            tracing::warn!(
                url = %url,
                entries = entries.len(),
                "yt-dlp exited non-zero but produced entries, continuing"
            );
        }
        Ok(entries)
    }
}

struct CommandOutput {
    stdout: String,
    stderr: String,
    success: bool,
}

#[async_trait]
impl Fetcher for CommandFetcher {
    async fn get_playlist(&self, url: &str) -> Result<Vec<PlaylistEntry>> {
        if !is_playlist_url(url) {
            // Single video: one full-metadata entry.
            return self
                .fetch_entries(&["--dump-json", "--no-warnings", "--no-playlist", url], url)
                .await;
        }

        // Flat fetch yields the complete entry list quickly.
        let flat = self
            .fetch_entries(&["--dump-json", "--no-warnings", "--flat-playlist", url], url)
            .await?;

        if !is_music_url(url) {
            return Ok(flat);
        }

        // YouTube Music playlists carry structured artist/track fields only
        // in full metadata, so fetch that too, best-effort, and merge by
        // video id with the flat list providing order and completeness.
        match self
            .fetch_entries(&["--dump-json", "--no-warnings", url], url)
            .await
        {
            Ok(full) => Ok(merge_entries(flat, full)),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "full metadata fetch failed, using flat entries");
                Ok(flat)
            }
        }
    }

    async fn get_channel_playlists(&self, url: &str) -> Result<Vec<ChannelPlaylist>> {
        let url = normalize_channel_url(url);
        let output = self
            .run(&["--flat-playlist", "--dump-json", "--no-warnings", &url])
            .await?;

        let playlists = parse_channel_playlists(&output.stdout);
        if playlists.is_empty() && !output.success {
            tracing::error!(url = %url, stderr = %output.stderr.trim(), "yt-dlp failed for channel");
            return Err(Error::Fetch(format!(
                "yt-dlp failed: {}",
                output.stderr.trim()
            )));
        }
        Ok(playlists)
    }

    async fn get_url_info(&self, url: &str) -> Result<String> {
        let output = self
            .run(&["--dump-single-json", "--flat-playlist", "--no-warnings", url])
            .await?;
        if !output.success {
            tracing::error!(url = %url, stderr = %output.stderr.trim(), "yt-dlp failed for URL info");
            return Err(Error::Fetch(format!(
                "yt-dlp failed: {}",
                output.stderr.trim()
            )));
        }

        #[derive(Deserialize)]
        struct Info {
            #[serde(default)]
            title: String,
        }
        let info: Info = serde_json::from_str(output.stdout.trim())?;
        Ok(info.title)
    }
}

/// Parse newline-delimited JSON entries, skipping malformed lines.
fn parse_entries(stdout: &str) -> Vec<PlaylistEntry> {
    let mut entries = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<PlaylistEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed yt-dlp output line");
            }
        }
    }
    entries
}

/// Merge a flat entry list with a best-effort full-metadata list.
///
/// The flat list defines order and completeness; full entries replace flat
/// ones when their video id is present.
fn merge_entries(flat: Vec<PlaylistEntry>, full: Vec<PlaylistEntry>) -> Vec<PlaylistEntry> {
    let mut by_id: HashMap<String, PlaylistEntry> = full
        .into_iter()
        .filter(|e| !e.video_id.is_empty())
        .map(|e| (e.video_id.clone(), e))
        .collect();

    flat.into_iter()
        .map(|entry| by_id.remove(&entry.video_id).unwrap_or(entry))
        .collect()
}

fn parse_channel_playlists(stdout: &str) -> Vec<ChannelPlaylist> {
    #[derive(Deserialize)]
    struct RawEntry {
        #[serde(default)]
        id: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        url: String,
    }

    let mut playlists = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(entry) = serde_json::from_str::<RawEntry>(line) else {
            tracing::debug!("skipping malformed yt-dlp output line");
            continue;
        };
        // Only include playlist entries, not loose videos.
        if !entry.url.is_empty() && entry.url.contains("list=") {
            playlists.push(ChannelPlaylist {
                id: entry.id,
                title: entry.title,
                url: entry.url,
            });
        }
    }
    playlists
}

fn is_playlist_url(url: &str) -> bool {
    url.contains("list=")
}

fn is_music_url(url: &str) -> bool {
    url.contains("music.youtube.com")
}

/// Ensure a channel URL points at its playlists tab.
fn normalize_channel_url(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if url.ends_with("/playlists") {
        return url.to_string();
    }
    for tab in ["/videos", "/shorts", "/streams", "/community"] {
        if let Some(stripped) = url.strip_suffix(tab) {
            return format!("{stripped}/playlists");
        }
    }
    format!("{url}/playlists")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_entries_reads_ndjson() {
        let stdout = concat!(
            r#"{"title":"Arctic Monkeys - Do I Wanna Know?","id":"v1","url":"https://youtu.be/v1"}"#,
            "\n",
            r#"{"title":"Radiohead - Creep","id":"v2","url":"https://youtu.be/v2","channel":"Radiohead"}"#,
            "\n",
        );
        let entries = parse_entries(stdout);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Arctic Monkeys - Do I Wanna Know?");
        assert_eq!(entries[0].video_id, "v1");
        assert_eq!(entries[1].channel.as_deref(), Some("Radiohead"));
    }

    #[test]
    fn parse_entries_skips_malformed_lines() {
        let stdout = concat!(
            r#"{"title":"Good Entry","id":"v1"}"#,
            "\n",
            "WARNING: not json at all\n",
            "{\"title\":\"truncated",
            "\n",
            r#"{"title":"Another Good Entry","id":"v2"}"#,
            "\n",
        );
        let entries = parse_entries(stdout);
        assert_eq!(entries.len(), 2, "malformed lines must be skipped");
        assert_eq!(entries[0].title, "Good Entry");
        assert_eq!(entries[1].title, "Another Good Entry");
    }

    #[test]
    fn parse_entries_reads_music_metadata_fields() {
        let stdout =
            r#"{"title":"Blinding Lights","id":"v1","artist":"The Weeknd","track":"Blinding Lights"}"#;
        let entries = parse_entries(stdout);
        assert_eq!(entries[0].artist.as_deref(), Some("The Weeknd"));
        assert_eq!(entries[0].track.as_deref(), Some("Blinding Lights"));
    }

    #[test]
    fn merge_prefers_full_metadata_and_keeps_flat_order() {
        let flat = vec![
            PlaylistEntry {
                title: "flat one".into(),
                video_id: "a".into(),
                ..Default::default()
            },
            PlaylistEntry {
                title: "flat two".into(),
                video_id: "b".into(),
                ..Default::default()
            },
            PlaylistEntry {
                title: "flat three".into(),
                video_id: "c".into(),
                ..Default::default()
            },
        ];
        // Full fetch partially failed: entry "b" is missing.
        let full = vec![
            PlaylistEntry {
                title: "full three".into(),
                video_id: "c".into(),
                artist: Some("Artist C".into()),
                ..Default::default()
            },
            PlaylistEntry {
                title: "full one".into(),
                video_id: "a".into(),
                artist: Some("Artist A".into()),
                ..Default::default()
            },
        ];

        let merged = merge_entries(flat, full);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].title, "full one");
        assert_eq!(merged[0].artist.as_deref(), Some("Artist A"));
        assert_eq!(merged[1].title, "flat two", "missing id falls back to flat");
        assert!(merged[1].artist.is_none());
        assert_eq!(merged[2].title, "full three");
    }

    #[test]
    fn channel_playlists_filter_out_plain_videos() {
        let stdout = concat!(
            r#"{"_type":"url","id":"PL1","title":"Favorites","url":"https://www.youtube.com/playlist?list=PL1"}"#,
            "\n",
            r#"{"_type":"url","id":"vid1","title":"Some Video","url":"https://www.youtube.com/watch?v=vid1"}"#,
            "\n",
            r#"{"_type":"url","id":"PL2","title":"Mixtape","url":"https://www.youtube.com/playlist?list=PL2"}"#,
            "\n",
        );
        let playlists = parse_channel_playlists(stdout);
        assert_eq!(playlists.len(), 2);
        assert_eq!(playlists[0].id, "PL1");
        assert_eq!(playlists[1].title, "Mixtape");
    }

    #[test]
    fn normalize_channel_url_appends_playlists_tab() {
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/@artist"),
            "https://www.youtube.com/@artist/playlists"
        );
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/@artist/"),
            "https://www.youtube.com/@artist/playlists"
        );
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/@artist/videos"),
            "https://www.youtube.com/@artist/playlists"
        );
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/@artist/shorts"),
            "https://www.youtube.com/@artist/playlists"
        );
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/@artist/streams"),
            "https://www.youtube.com/@artist/playlists"
        );
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/@artist/community"),
            "https://www.youtube.com/@artist/playlists"
        );
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/@artist/playlists"),
            "https://www.youtube.com/@artist/playlists"
        );
    }

    #[test]
    fn playlist_and_music_url_detection() {
        assert!(is_playlist_url("https://www.youtube.com/playlist?list=PL1"));
        assert!(!is_playlist_url("https://youtu.be/abc123"));
        assert!(is_music_url("https://music.youtube.com/playlist?list=PL1"));
        assert!(!is_music_url("https://www.youtube.com/playlist?list=PL1"));
    }
}
