//! Application state for the API server

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::ytdlp::Fetcher;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clones) and provides access to the
/// session engine, the fetcher and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The session engine
    pub pipeline: Pipeline,

    /// Fetcher used directly by the channel/url-info preview endpoints
    pub fetcher: Arc<dyn Fetcher>,

    /// Configuration (read-only after startup)
    pub config: Arc<Config>,

    /// Process start time, for the stats endpoint
    pub started_at: Instant,
}

impl AppState {
    /// Create a new AppState
    pub fn new(pipeline: Pipeline, fetcher: Arc<dyn Fetcher>, config: Arc<Config>) -> Self {
        Self {
            pipeline,
            fetcher,
            config,
            started_at: Instant::now(),
        }
    }
}
