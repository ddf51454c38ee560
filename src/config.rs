//! Configuration types for deemix-sync
//!
//! All settings are read from environment variables at startup. Only
//! `DEEMIX_ARL` is required; everything else has a sensible default.

use crate::error::{Error, Result};
use crate::navidrome::MatchMode;
use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on (`PORT`, default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Development mode, enables permissive CORS (`DEV_MODE`, default: false)
    #[serde(default)]
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            dev_mode: false,
        }
    }
}

/// Deemix downloader service configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeemixConfig {
    /// Base URL of the Deemix instance (`DEEMIX_URL`, default: http://localhost:6595)
    #[serde(default = "default_deemix_url")]
    pub base_url: String,

    /// Deezer ARL token used to authenticate (`DEEMIX_ARL`, required)
    pub arl: String,
}

/// Navidrome library check configuration
///
/// Present only when `NAVIDROME_URL`, `NAVIDROME_USER` and
/// `NAVIDROME_PASSWORD` are all set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavidromeConfig {
    /// Base URL of the Navidrome/Subsonic instance (`NAVIDROME_URL`)
    pub base_url: String,

    /// Subsonic API user (`NAVIDROME_USER`)
    pub user: String,

    /// Subsonic API password (`NAVIDROME_PASSWORD`)
    pub password: String,

    /// How library results are compared to the query
    /// (`NAVIDROME_MATCH_MODE`, default: substring)
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Whether the frontend should default the library check to on
    /// (`NAVIDROME_SKIP_DEFAULT`, default: false)
    #[serde(default)]
    pub skip_default: bool,
}

/// Session engine tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum confidence score (0-100) for auto-selecting a match
    /// (`CONFIDENCE_THRESHOLD`, default: 70)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Deemix downloader settings
    pub deemix: DeemixConfig,

    /// Optional Navidrome library check settings
    #[serde(default)]
    pub navidrome: Option<NavidromeConfig>,

    /// Session engine tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails only when `DEEMIX_ARL` is absent or a numeric variable does
    /// not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// `from_env` is a thin wrapper over this; tests inject a map instead
    /// of mutating the process environment.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| Error::Config {
                message: format!("PORT must be a port number, got {raw:?}"),
                key: Some("PORT".into()),
            })?,
            None => default_port(),
        };

        let arl = lookup("DEEMIX_ARL").filter(|v| !v.is_empty()).ok_or_else(|| {
            Error::Config {
                message: "DEEMIX_ARL environment variable is required".into(),
                key: Some("DEEMIX_ARL".into()),
            }
        })?;

        let deemix = DeemixConfig {
            base_url: lookup("DEEMIX_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_deemix_url),
            arl,
        };

        // Navidrome is enabled only when the full credential triple is set.
        let navidrome = match (
            lookup("NAVIDROME_URL").filter(|v| !v.is_empty()),
            lookup("NAVIDROME_USER").filter(|v| !v.is_empty()),
            lookup("NAVIDROME_PASSWORD").filter(|v| !v.is_empty()),
        ) {
            (Some(base_url), Some(user), Some(password)) => {
                let match_mode = lookup("NAVIDROME_MATCH_MODE")
                    .map(|raw| {
                        let mode = MatchMode::parse(&raw);
                        if mode.is_none() {
                            tracing::warn!(
                                value = %raw,
                                "unknown NAVIDROME_MATCH_MODE, falling back to substring"
                            );
                        }
                        mode.unwrap_or_default()
                    })
                    .unwrap_or_default();

                Some(NavidromeConfig {
                    base_url,
                    user,
                    password,
                    match_mode,
                    skip_default: lookup("NAVIDROME_SKIP_DEFAULT").as_deref() == Some("true"),
                })
            }
            _ => None,
        };

        let confidence_threshold = match lookup("CONFIDENCE_THRESHOLD") {
            Some(raw) => {
                let parsed = raw.parse::<i64>().map_err(|_| Error::Config {
                    message: format!("CONFIDENCE_THRESHOLD must be an integer, got {raw:?}"),
                    key: Some("CONFIDENCE_THRESHOLD".into()),
                })?;
                parsed.clamp(0, 100) as u8
            }
            None => default_confidence_threshold(),
        };

        Ok(Self {
            server: ServerConfig {
                port,
                dev_mode: lookup("DEV_MODE").as_deref() == Some("true"),
            },
            deemix,
            navidrome,
            pipeline: PipelineConfig {
                confidence_threshold,
            },
        })
    }
}

fn default_port() -> u16 {
    8080
}

fn default_deemix_url() -> String {
    "http://localhost:6595".to_string()
}

fn default_confidence_threshold() -> u8 {
    70
}
