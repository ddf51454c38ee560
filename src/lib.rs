//! # deemix-sync
//!
//! Backend for syncing YouTube playlists into a Deemix download queue.
//!
//! The flow is two-phase: an **analysis** phase resolves a playlist with
//! yt-dlp, parses artist/song pairs out of the video titles, searches
//! Deezer through Deemix for each track and scores how well the top result
//! matches; a later **download** phase queues whatever the user kept
//! selected. An optional Navidrome check skips tracks the library already
//! has.
//!
//! ## Quick Start
//!
//! ```no_run
//! use deemix_sync::{CommandFetcher, Config, HttpDeemixClient, Pipeline};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> deemix_sync::Result<()> {
//!     let config = Config::from_env()?;
//!     let fetcher = Arc::new(CommandFetcher::from_path().expect("yt-dlp not found"));
//!     let deemix = Arc::new(HttpDeemixClient::new(
//!         config.deemix.base_url.clone(),
//!         config.deemix.arl.clone(),
//!     )?);
//!
//!     let pipeline = Pipeline::new(fetcher, deemix, None);
//!     let session_id = pipeline
//!         .analyze("https://www.youtube.com/playlist?list=PL123", 3, false)
//!         .await;
//!
//!     // Poll for progress, then commit the selection.
//!     let _snapshot = pipeline.get_session(&session_id).await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Deemix downloader service client
pub mod deemix;
/// Error types
pub mod error;
/// Navidrome library existence checks
pub mod navidrome;
/// Video title parsing
pub mod parser;
/// Sync session engine
pub mod pipeline;
/// Core session types
pub mod types;
/// YouTube metadata extraction via yt-dlp
pub mod ytdlp;

// Re-export commonly used types
pub use config::{Config, DeemixConfig, NavidromeConfig, PipelineConfig, ServerConfig};
pub use deemix::{
    BITRATE_128, BITRATE_320, BITRATE_FLAC, DeemixClient, HttpDeemixClient, SearchResult,
};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use navidrome::{HttpNavidromeClient, LibraryEntry, MatchMode, NavidromeClient};
pub use pipeline::{DEFAULT_CONFIDENCE_THRESHOLD, Pipeline, calculate_confidence};
pub use types::{Progress, Session, SessionStatus, Track, TrackStatus};
pub use ytdlp::{ChannelPlaylist, CommandFetcher, Fetcher, PlaylistEntry};

/// Wait for a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn shutdown_signal() {
    wait_for_signal().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers,
    // tests).
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
