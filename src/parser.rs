//! Video title parsing
//!
//! Extracts an `(artist, song)` pair from human-authored YouTube video
//! titles. Extractors report structured artist/track fields for YouTube
//! Music content and the pipeline prefers those; this parser is the
//! fallback for regular uploads.

use once_cell::sync::Lazy;
use regex::Regex;

/// Compile a hard-coded pattern.
#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hard-coded pattern must compile")
}

/// Matches common noise suffixes in brackets: (Official Video), [Lyrics], etc.
static SUFFIX_PATTERNS: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"(?i)\s*[\(\[](official\s*(music\s*|lyric\s*)?video|official\s*audio|lyrics?\s*(video)?|audio|hd|hq|4k|music\s*video|lyric\s*video|mv|visuali[sz]er|live|remix|feat\.?[^\)\]]*|ft\.?[^\)\]]*|prod\.?[^\)\]]*|video\s*oficial)[\)\]]",
    )
});

/// Matches trailing noise markers not in brackets: " - Official Video" etc.
static TRAILING_NOISE: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"(?i)\s*[-–—|]\s*(official\s*(music\s*)?video|official\s*audio|lyrics?\s*(video)?|audio|hd|hq|4k|music\s*video|mv|visuali[sz]er)\s*$",
    )
});

/// Matches " - Topic" channel name artifacts.
static TOPIC_SUFFIX: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\s*-\s*topic\s*$"));

/// Normalizes featured-artist notation within a piece.
static FEAT_PATTERN: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\s*\b(feat\.?|ft\.?)\s+"));

/// Matches `Artist "Song Title"` (straight or curly quotes).
static QUOTED_PATTERN: Lazy<Regex> =
    Lazy::new(|| compile("^(.+?)\\s+[\"\u{201c}](.+?)[\"\u{201d}]$"));

/// Matches `Song by Artist`.
static BY_PATTERN: Lazy<Regex> = Lazy::new(|| compile(r"(?i)^(.+?)\s+by\s+(.+)$"));

/// Collapses runs of whitespace.
static EXTRA_WHITESPACE: Lazy<Regex> = Lazy::new(|| compile(r"\s{2,}"));

/// Delimiters in priority order.
const DELIMITERS: [&str; 5] = [" - ", " – ", " — ", " | ", " ~ "];

/// Extract artist and song from a YouTube video title.
///
/// Returns `(artist, song)`. If parsing fails, artist is empty and song is
/// the cleaned title (still usable as a search query).
pub fn parse(title: &str) -> (String, String) {
    let cleaned = clean(title);

    // Try delimiter-based splitting.
    for delim in DELIMITERS {
        if let Some(idx) = cleaned.find(delim) {
            if idx > 0 {
                let artist = cleaned[..idx].trim();
                let song = cleaned[idx + delim.len()..].trim();
                if !artist.is_empty() && !song.is_empty() {
                    let artist = TOPIC_SUFFIX.replace(artist, "");
                    return (normalize_feat(artist.trim()), normalize_feat(song));
                }
            }
        }
    }

    // Try quoted title: Artist "Song Title".
    if let Some(caps) = QUOTED_PATTERN.captures(&cleaned) {
        let artist = caps[1].trim();
        let song = caps[2].trim();
        if !artist.is_empty() && !song.is_empty() {
            return (normalize_feat(artist), normalize_feat(song));
        }
    }

    // Try "Song by Artist" pattern.
    if let Some(caps) = BY_PATTERN.captures(&cleaned) {
        let song = caps[1].trim();
        let artist = caps[2].trim();
        if !artist.is_empty() && !song.is_empty() {
            return (normalize_feat(artist), normalize_feat(song));
        }
    }

    // Fallback: cleaned title as song, no artist.
    (String::new(), normalize_feat(&cleaned))
}

/// Remove noise from a title.
fn clean(title: &str) -> String {
    let s = SUFFIX_PATTERNS.replace_all(title, "");
    let s = TRAILING_NOISE.replace_all(&s, "");
    let s = TOPIC_SUFFIX.replace_all(&s, "");
    let s = EXTRA_WHITESPACE.replace_all(&s, " ");
    s.trim().to_string()
}

/// Standardize "feat." and "ft." to "feat.".
fn normalize_feat(s: &str) -> String {
    FEAT_PATTERN.replace_all(s, " feat. ").trim().to_string()
}
