//! The analyze entry point and the analysis worker.

use super::control::{ControlSignals, SessionControl};
use super::{Pipeline, build_query, confidence::calculate_confidence, generate_session_id};
use crate::error::{Error, Result};
use crate::parser;
use crate::types::{Session, SessionStatus, Track, TrackStatus};

impl Pipeline {
    /// Begin a new analysis session for the given URL and bitrate code.
    ///
    /// Returns the session id immediately; the analysis workflow runs on a
    /// dedicated task and stops at `ready`, where it waits for
    /// [`Pipeline::download`] or a cancel. The session outlives the HTTP
    /// request that started it; cancellation comes only from
    /// [`Pipeline::cancel_session`].
    pub async fn analyze(&self, url: &str, bitrate: u32, check_navidrome: bool) -> String {
        let (control, signals) = SessionControl::new();

        let session_id = {
            let mut state = self.state.write().await;
            let mut id = generate_session_id();
            // 64 bits of randomness; a collision is effectively impossible
            // but re-rolling is cheaper than reasoning about overwrites.
            while state.sessions.contains_key(&id) {
                id = generate_session_id();
            }
            state.sessions.insert(
                id.clone(),
                Session::new(id.clone(), url.to_string(), bitrate, check_navidrome),
            );
            state.controls.insert(id.clone(), control);
            id
        };

        tracing::info!(session_id = %session_id, url = %url, "analysis started");

        let pipeline = self.clone();
        let worker_id = session_id.clone();
        tokio::spawn(async move {
            match pipeline.run_analysis(&worker_id, signals).await {
                Ok(()) => {}
                Err(Error::Canceled) => pipeline.finish_canceled(&worker_id).await,
                Err(e) => {
                    pipeline
                        .set_session_error(&worker_id, &e.to_string())
                        .await;
                }
            }
        });

        session_id
    }

    /// Drive one session from `fetching` to `ready`.
    async fn run_analysis(&self, session_id: &str, mut signals: ControlSignals) -> Result<()> {
        let (url, check_navidrome) = {
            let state = self.state.read().await;
            let session = state
                .sessions
                .get(session_id)
                .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
            (session.url.clone(), session.check_navidrome)
        };

        // Phase 1: fetch playlist metadata.
        let entries = tokio::select! {
            res = self.fetcher.get_playlist(&url) => match res {
                Ok(entries) => entries,
                Err(e) => {
                    self.set_session_error(
                        session_id,
                        &format!("failed to fetch playlist: {e}"),
                    )
                    .await;
                    return Ok(());
                }
            },
            _ = signals.cancel.cancelled() => return Err(Error::Canceled),
        };

        // Phase 2: parse titles.
        let total = entries.len();
        {
            let mut state = self.state.write().await;
            if signals.cancel.is_cancelled() {
                return Err(Error::Canceled);
            }
            if let Some(session) = state.sessions.get_mut(session_id) {
                session.status = SessionStatus::Parsing;
                session.tracks = entries
                    .iter()
                    .map(|entry| {
                        // YouTube Music provides structured metadata; prefer
                        // it over title parsing. The channel name is not a
                        // usable artist fallback.
                        let (artist, song) = match entry.artist.as_deref() {
                            Some(artist) if !artist.is_empty() => {
                                let song = entry
                                    .track
                                    .clone()
                                    .filter(|t| !t.is_empty())
                                    .unwrap_or_else(|| entry.title.clone());
                                (artist.to_string(), song)
                            }
                            _ => parser::parse(&entry.title),
                        };
                        Track::pending(entry.title.clone(), artist, song)
                    })
                    .collect();
                session.progress.total = total;
                session.status = SessionStatus::Searching;
            }
        }

        // Phase 3: search the downloader for each track.
        for i in 0..total {
            self.checkpoint(session_id, &mut signals, SessionStatus::Searching)
                .await?;

            let query = {
                let mut state = self.state.write().await;
                let Some(session) = state.sessions.get_mut(session_id) else {
                    return Ok(());
                };
                let track = &mut session.tracks[i];
                track.status = TrackStatus::Searching;
                build_query(&track.parsed_artist, &track.parsed_song)
            };

            let result = tokio::select! {
                res = self.deemix.search(&query) => res,
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

                let best = match result {
                    Ok(mut results) if !results.is_empty() => Some(results.remove(0)),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::debug!(session_id = %session_id, track = i, error = %e, "search failed");
                        None
                    }
                };

                match best {
                    None => {
                        track.status = TrackStatus::NotFound;
                        session.progress.not_found += 1;
                    }
                    Some(best) => {
                        let confidence = calculate_confidence(
                            &track.parsed_artist,
                            &track.parsed_song,
                            &best.artist,
                            &best.title,
                        );
                        track.deezer_match = Some(best);
                        track.confidence = confidence;

                        if confidence >= self.confidence_threshold {
                            track.status = TrackStatus::Found;
                            track.selected = true;
                            session.progress.selected += 1;
                        } else {
                            track.status = TrackStatus::NeedsReview;
                            session.progress.needs_review += 1;
                        }
                    }
                }
                session.progress.searched += 1;
            }

            if i + 1 < total {
                self.sleep_cancellable(self.search_delay, &signals).await?;
            }
        }

        // Phase 3.5: check the library for already-owned tracks.
        if let Some(navidrome) = self.navidrome.clone() {
            if check_navidrome {
                self.set_status_if_running(session_id, SessionStatus::Checking)
                    .await;

                for i in 0..total {
                    self.checkpoint(session_id, &mut signals, SessionStatus::Checking)
                        .await?;

                    let query = {
                        let state = self.state.read().await;
                        let Some(session) = state.sessions.get(session_id) else {
                            return Ok(());
                        };
                        let track = &session.tracks[i];
                        if track.deezer_match.is_none() {
                            None
                        } else {
                            Some((track.parsed_artist.clone(), track.parsed_song.clone()))
                        }
                    };
                    let Some((artist, song)) = query else {
                        continue;
                    };

                    let result = tokio::select! {
                        res = navidrome.search(&artist, &song) => res,
                        _ = signals.cancel.cancelled() => return Err(Error::Canceled),
                    };

                    match result {
                        Ok(hits) if !hits.is_empty() => {
                            let mut state = self.state.write().await;
                            if signals.cancel.is_cancelled() {
                                return Err(Error::Canceled);
                            }
                            let Some(session) = state.sessions.get_mut(session_id) else {
                                return Ok(());
                            };
                            let track = &mut session.tracks[i];
                            let was_selected = track.selected;
                            let old_status = track.status;
                            track.selected = false;
                            track.status = TrackStatus::Skipped;
                            super::update_progress_for_status_change(
                                &mut session.progress,
                                old_status,
                                TrackStatus::Skipped,
                                was_selected,
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            // A failing library is treated as "not present".
                            tracing::warn!(
                                session_id = %session_id,
                                track = i,
                                error = %e,
                                "library check failed, keeping track"
                            );
                        }
                    }

                    if i + 1 < total {
                        self.sleep_cancellable(self.check_delay, &signals).await?;
                    }
                }
            }
        }

        // Analysis complete. Wait for the user to trigger a download.
        {
            let mut state = self.state.write().await;
            if let Some(session) = state.sessions.get_mut(session_id) {
                if session.status.is_terminal() {
                    return Ok(());
                }
                session.status = SessionStatus::Ready;
                tracing::info!(
                    session_id = %session_id,
                    selected = session.progress.selected,
                    skipped = session.progress.skipped,
                    needs_review = session.progress.needs_review,
                    not_found = session.progress.not_found,
                    "session ready"
                );
            }
        }

        Ok(())
    }
}
