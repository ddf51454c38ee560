//! The download worker and manual track re-search.

use super::control::{ControlSignals, SessionControl};
use super::{Pipeline, build_query, confidence::calculate_confidence, update_progress_for_status_change};
use crate::error::{Error, Result};
use crate::types::{SessionStatus, TrackStatus};

impl Pipeline {
    /// Queue every selected track of a `ready` session on the downloader.
    ///
    /// Validates and transitions the session to `downloading`, installs a
    /// fresh control (the analysis-phase control is discarded) and returns;
    /// the queueing loop runs on a dedicated task and finishes at `done`.
    pub async fn download(&self, session_id: &str) -> Result<()> {
        let (control, signals) = SessionControl::new();

        {
            let mut state = self.state.write().await;
            let state = &mut *state;
            let session = state
                .sessions
                .get_mut(session_id)
                .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

            if session.status != SessionStatus::Ready {
                return Err(Error::SessionNotReady {
                    id: session_id.to_string(),
                    status: session.status,
                });
            }
            session.status = SessionStatus::Downloading;
            state.controls.insert(session_id.to_string(), control);

            tracing::info!(
                session_id = %session_id,
                selected = session.progress.selected,
                "download started"
            );
        }

        let pipeline = self.clone();
        let worker_id = session_id.to_string();
        tokio::spawn(async move {
            match pipeline.run_download(&worker_id, signals).await {
                Ok(()) => {}
                Err(Error::Canceled) => pipeline.finish_canceled(&worker_id).await,
                Err(e) => {
                    pipeline
                        .set_session_error(&worker_id, &e.to_string())
                        .await;
                }
            }
        });

        Ok(())
    }

    /// Enqueue all selected tracks in order, then mark the session `done`.
    async fn run_download(&self, session_id: &str, mut signals: ControlSignals) -> Result<()> {
        let (total, bitrate) = {
            let state = self.state.read().await;
            let session = state
                .sessions
                .get(session_id)
                .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
            (session.tracks.len(), session.bitrate)
        };

        for i in 0..total {
            self.checkpoint(session_id, &mut signals, SessionStatus::Downloading)
                .await?;

            let link = {
                let state = self.state.read().await;
                let Some(session) = state.sessions.get(session_id) else {
                    return Ok(());
                };
                let track = &session.tracks[i];
                if !track.selected {
                    None
                } else {
                    track.deezer_match.as_ref().map(|m| m.link.clone())
                }
            };
            let Some(link) = link else {
                continue;
            };

            let result = tokio::select! {
                res = self.deemix.add_to_queue(&link, bitrate) => res,
                _ = signals.cancel.cancelled() => return Err(Error::Canceled),
            };

            {
                let mut state = self.state.write().await;
                if signals.cancel.is_cancelled() {
                    return Err(Error::Canceled);
                }
                let Some(session) = state.sessions.get_mut(session_id) else {
                    return Ok(());
                };
                let track = &mut session.tracks[i];
                match result {
                    Ok(()) => {
                        track.status = TrackStatus::Queued;
                        session.progress.queued += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            session_id = %session_id,
                            track = i,
                            link = %link,
                            error = %e,
                            "queue request failed"
                        );
                        track.status = TrackStatus::Error;
                    }
                }
            }

            if i + 1 < total {
                self.sleep_cancellable(self.queue_delay, &signals).await?;
            }
        }

        {
            let mut state = self.state.write().await;
            if let Some(session) = state.sessions.get_mut(session_id) {
                if session.status.is_terminal() {
                    return Ok(());
                }
                session.status = SessionStatus::Done;
                tracing::info!(
                    session_id = %session_id,
                    queued = session.progress.queued,
                    "download done"
                );
            }
        }

        Ok(())
    }

    /// Manually re-search the downloader for one track.
    ///
    /// The caller passes only the user-edited portion of the query; the
    /// track's parsed artist is prepended. The first result replaces the
    /// track's match and the track is re-categorised exactly like the
    /// automatic path: library hit -> `skipped`, confidence at or above the
    /// threshold -> `found` and selected, otherwise `needs_review`.
    pub async fn search_track(
        &self,
        session_id: &str,
        track_index: usize,
        query: &str,
    ) -> Result<()> {
        let (parsed_artist, parsed_song, check_library) = {
            let state = self.state.read().await;
            let session = state
                .sessions
                .get(session_id)
                .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
            if session.status != SessionStatus::Ready {
                return Err(Error::SessionNotReady {
                    id: session_id.to_string(),
                    status: session.status,
                });
            }
            let track = session
                .tracks
                .get(track_index)
                .ok_or(Error::TrackOutOfRange {
                    index: track_index,
                    len: session.tracks.len(),
                })?;
            (
                track.parsed_artist.clone(),
                track.parsed_song.clone(),
                session.check_navidrome,
            )
        };

        let effective_query = build_query(&parsed_artist, query);
        let results = self.deemix.search(&effective_query).await?;

        let Some(best) = results.into_iter().next() else {
            // No result: the track drops back to not_found.
            let mut state = self.state.write().await;
            let session = state
                .sessions
                .get_mut(session_id)
                .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
            let track = &mut session.tracks[track_index];
            let old_status = track.status;
            let was_selected = track.selected;

            track.deezer_match = None;
            track.confidence = 0;
            track.selected = false;
            track.status = TrackStatus::NotFound;
            update_progress_for_status_change(
                &mut session.progress,
                old_status,
                TrackStatus::NotFound,
                was_selected,
            );
            return Ok(());
        };

        let confidence =
            calculate_confidence(&parsed_artist, &parsed_song, &best.artist, &best.title);

        // Re-run the library check against the new match before deciding.
        let library_hit = match (&self.navidrome, check_library) {
            (Some(navidrome), true) => match navidrome.search(&best.artist, &best.title).await {
                Ok(hits) => !hits.is_empty(),
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        track = track_index,
                        error = %e,
                        "library check failed during manual search"
                    );
                    false
                }
            },
            _ => false,
        };

        let mut state = self.state.write().await;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        let track = &mut session.tracks[track_index];
        let old_status = track.status;
        let was_selected = track.selected;

        let (new_status, new_selected) = if library_hit {
            (TrackStatus::Skipped, false)
        } else if confidence >= self.confidence_threshold {
            (TrackStatus::Found, true)
        } else {
            (TrackStatus::NeedsReview, false)
        };

        tracing::info!(
            session_id = %session_id,
            track = track_index,
            artist = %best.artist,
            title = %best.title,
            confidence = confidence,
            status = %new_status,
            "manual search matched"
        );

        track.deezer_match = Some(best);
        track.confidence = confidence;
        track.status = new_status;
        track.selected = new_selected;
        update_progress_for_status_change(
            &mut session.progress,
            old_status,
            new_status,
            was_selected,
        );
        if new_selected {
            session.progress.selected += 1;
        }

        Ok(())
    }
}
