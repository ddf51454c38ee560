//! deemix-sync server binary.
//!
//! Loads configuration from the environment, wires the adapters and serves
//! the REST API until SIGTERM/SIGINT.

use deemix_sync::api::{self, AppState};
use deemix_sync::navidrome::NavidromeClient;
use deemix_sync::{
    CommandFetcher, Config, DeemixClient, HttpDeemixClient, HttpNavidromeClient, Pipeline,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> deemix_sync::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("deemix_sync=info,tower_http=warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let fetcher = Arc::new(
        CommandFetcher::from_path().unwrap_or_else(|| {
            tracing::warn!("yt-dlp not found in PATH, relying on it appearing at runtime");
            CommandFetcher::new(PathBuf::from("yt-dlp"))
        }),
    );

    let deemix = Arc::new(HttpDeemixClient::new(
        config.deemix.base_url.clone(),
        config.deemix.arl.clone(),
    )?);

    // A failed login is not fatal: Deemix may simply not be up yet, and the
    // session cookie is re-established on the next request.
    if let Err(e) = deemix.login().await {
        tracing::warn!(error = %e, "Deemix login failed");
    } else {
        tracing::info!(url = %config.deemix.base_url, "logged in to Deemix");
    }

    let navidrome: Option<Arc<dyn NavidromeClient>> = config.navidrome.as_ref().map(|nav| {
        tracing::info!(
            url = %nav.base_url,
            match_mode = %nav.match_mode,
            "Navidrome integration enabled"
        );
        Arc::new(HttpNavidromeClient::new(
            nav.base_url.clone(),
            nav.user.clone(),
            nav.password.clone(),
            nav.match_mode,
        )) as Arc<dyn NavidromeClient>
    });

    let pipeline = Pipeline::new(fetcher.clone(), deemix, navidrome)
        .with_confidence_threshold(i64::from(config.pipeline.confidence_threshold));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let state = AppState::new(pipeline, fetcher, config);
    api::serve(state, addr).await
}
