//! Match confidence scoring
//!
//! Estimates how likely a Deezer search result is the track the video title
//! referred to. Scores are integers in 0..=100 and gate auto-selection.

/// Compute a confidence score (0-100) for a candidate match.
///
/// Title similarity always contributes; artist similarity contributes only
/// when the parser produced an artist. Without artist information the score
/// is capped at 60, which keeps such matches below any threshold that
/// expects both fields to agree.
pub fn calculate_confidence(
    parsed_artist: &str,
    parsed_song: &str,
    result_artist: &str,
    result_title: &str,
) -> u8 {
    let parsed_artist = parsed_artist.trim().to_lowercase();
    let parsed_song = parsed_song.trim().to_lowercase();
    let result_artist = result_artist.trim().to_lowercase();
    let result_title = result_title.trim().to_lowercase();

    let title_sim = similarity(&parsed_song, &result_title);

    if parsed_artist.is_empty() {
        return (title_sim * 60.0) as u8;
    }

    let artist_sim = similarity(&parsed_artist, &result_artist);

    // Combined score: 40% artist + 60% title.
    let combined = artist_sim * 0.4 + title_sim * 0.6;
    (combined * 100.0) as u8
}

/// Normalized similarity score in [0.0, 1.0] based on Levenshtein distance.
///
/// Comparison is byte-wise, matching the distance function below.
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    let dist = levenshtein(a.as_bytes(), b.as_bytes());
    1.0 - dist as f64 / max_len as f64
}

/// Edit distance with unit cost for insertion, deletion and substitution.
fn levenshtein(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (curr[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
