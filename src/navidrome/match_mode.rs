//! Library match modes
//!
//! Subsonic's `search2` is a loose full-text search; these modes decide
//! which of its results actually count as "we already own this track".

use crate::pipeline::confidence::similarity;
use serde::{Deserialize, Serialize};

const FUZZY_SIMILARITY_THRESHOLD: f64 = 0.8;

/// How library search results are compared to the query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Case-insensitive substring containment on title and artist (default)
    #[default]
    Substring,
    /// Case-insensitive exact match on title and artist
    Exact,
    /// Levenshtein similarity >= 0.8 on title and artist
    Fuzzy,
}

impl MatchMode {
    /// Parse a wire/env value. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" | "substring" => Some(MatchMode::Substring),
            "exact" => Some(MatchMode::Exact),
            "fuzzy" => Some(MatchMode::Fuzzy),
            _ => None,
        }
    }

    /// The wire string for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::Substring => "substring",
            MatchMode::Exact => "exact",
            MatchMode::Fuzzy => "fuzzy",
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a library song matches the queried artist/title under `mode`.
pub(crate) fn matches_song(
    mode: MatchMode,
    song_artist: &str,
    song_title: &str,
    query_artist: &str,
    query_title: &str,
) -> bool {
    match mode {
        MatchMode::Exact => {
            song_title.eq_ignore_ascii_case(query_title)
                && song_artist.eq_ignore_ascii_case(query_artist)
        }
        MatchMode::Fuzzy => {
            similarity(&song_title.to_lowercase(), &query_title.to_lowercase())
                >= FUZZY_SIMILARITY_THRESHOLD
                && similarity(&song_artist.to_lowercase(), &query_artist.to_lowercase())
                    >= FUZZY_SIMILARITY_THRESHOLD
        }
        MatchMode::Substring => {
            song_title
                .to_lowercase()
                .contains(&query_title.to_lowercase())
                && song_artist
                    .to_lowercase()
                    .contains(&query_artist.to_lowercase())
        }
    }
}
