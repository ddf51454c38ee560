
use super::{build_query, generate_session_id, update_progress_for_status_change};
use crate::types::{Progress, TrackStatus};

#[test]
fn build_query_joins_artist_and_song() {
    assert_eq!(
        build_query("Arctic Monkeys", "Do I Wanna Know?"),
        "Arctic Monkeys Do I Wanna Know?"
    );
    assert_eq!(build_query("", "Wonderwall"), "Wonderwall");
}

#[test]
fn session_ids_are_16_lowercase_hex_chars() {
    for _ in 0..32 {
        let id = generate_session_id();
        assert_eq!(id.len(), 16, "id {id:?} must be 16 chars");
        assert!(
            id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
            "id {id:?} must be lowercase hex"
        );
    }
}

#[test]
fn progress_helper_moves_counts_between_categories() {
    let mut progress = Progress {
        total: 3,
        searched: 3,
        selected: 1,
        queued: 0,
        not_found: 1,
        needs_review: 1,
        skipped: 0,
    };

    // not_found -> found (selection is incremented by the caller)
    update_progress_for_status_change(
        &mut progress,
        TrackStatus::NotFound,
        TrackStatus::Found,
        false,
    );
    assert_eq!(progress.not_found, 0);
    assert_eq!(progress.selected, 1);

    // needs_review -> skipped
    update_progress_for_status_change(
        &mut progress,
        TrackStatus::NeedsReview,
        TrackStatus::Skipped,
        false,
    );
    assert_eq!(progress.needs_review, 0);
    assert_eq!(progress.skipped, 1);

    // found+selected -> skipped
    update_progress_for_status_change(
        &mut progress,
        TrackStatus::Found,
        TrackStatus::Skipped,
        true,
    );
    assert_eq!(progress.selected, 0);
    assert_eq!(progress.skipped, 2);
}

#[test]
fn progress_helper_is_neutral_for_same_category() {
    let mut progress = Progress {
        total: 1,
        searched: 1,
        not_found: 1,
        ..Default::default()
    };
    update_progress_for_status_change(
        &mut progress,
        TrackStatus::NotFound,
        TrackStatus::NotFound,
        false,
    );
    assert_eq!(progress.not_found, 1);
}
