//! Session lifecycle control: pause, resume, cancel.
//!
//! Each session owns a [`SessionControl`] while a phase worker is running:
//! a cancellation token plus two single-slot signal channels. The worker
//! holds the receiving half ([`ControlSignals`]) and observes both signals
//! at a checkpoint at the top of every loop iteration, so pause and cancel
//! take effect between I/O-bound steps rather than mid-mutation.

use super::Pipeline;
use crate::error::{Error, Result};
use crate::types::SessionStatus;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Caller-side control handles for one session phase
///
/// Created at analysis start and re-created at download start, so control
/// scopes follow the active phase.
pub(crate) struct SessionControl {
    pub(crate) cancel: CancellationToken,
    pub(crate) pause_tx: mpsc::Sender<()>,
    pub(crate) resume_tx: mpsc::Sender<()>,
}

/// Worker-side signal receivers for one session phase
pub(crate) struct ControlSignals {
    pub(crate) cancel: CancellationToken,
    pub(crate) pause_rx: mpsc::Receiver<()>,
    pub(crate) resume_rx: mpsc::Receiver<()>,
}

impl SessionControl {
    /// Create a control/signals pair for a new phase worker.
    pub(crate) fn new() -> (SessionControl, ControlSignals) {
        let cancel = CancellationToken::new();
        let (pause_tx, pause_rx) = mpsc::channel(1);
        let (resume_tx, resume_rx) = mpsc::channel(1);
        (
            SessionControl {
                cancel: cancel.clone(),
                pause_tx,
                resume_tx,
            },
            ControlSignals {
                cancel,
                pause_rx,
                resume_rx,
            },
        )
    }
}

impl Pipeline {
    /// Request that a session pause at its next checkpoint.
    ///
    /// Non-blocking: the pause signal is dropped if one is already pending.
    /// Valid only while the session is in an active phase; the `paused`
    /// status appears once the worker observes the signal.
    pub async fn pause_session(&self, session_id: &str) -> Result<()> {
        let pause_tx = {
            let state = self.state.read().await;
            let session = state
                .sessions
                .get(session_id)
                .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

            match session.status {
                SessionStatus::Paused => {
                    return Err(Error::SessionAlreadyPaused(session_id.to_string()));
                }
                status if !status.is_active() => {
                    return Err(Error::SessionNotActive {
                        id: session_id.to_string(),
                        status,
                    });
                }
                _ => {}
            }

            state
                .controls
                .get(session_id)
                .map(|control| control.pause_tx.clone())
        };

        if let Some(pause_tx) = pause_tx {
            let _ = pause_tx.try_send(());
        }
        tracing::info!(session_id = %session_id, "pause requested");
        Ok(())
    }

    /// Resume a paused session.
    ///
    /// Non-blocking: the worker restores the interrupted phase status when
    /// it receives the signal.
    pub async fn resume_session(&self, session_id: &str) -> Result<()> {
        let resume_tx = {
            let state = self.state.read().await;
            let session = state
                .sessions
                .get(session_id)
                .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

            if session.status != SessionStatus::Paused {
                return Err(Error::SessionNotPaused {
                    id: session_id.to_string(),
                    status: session.status,
                });
            }

            state
                .controls
                .get(session_id)
                .map(|control| control.resume_tx.clone())
        };

        if let Some(resume_tx) = resume_tx {
            let _ = resume_tx.try_send(());
        }
        tracing::info!(session_id = %session_id, "resume requested");
        Ok(())
    }

    /// Cancel a session.
    ///
    /// Cancels the phase worker's token, wakes a paused worker via the
    /// resume channel so it can observe the cancellation, and marks the
    /// session `canceled`. Terminal sessions reject further cancels.
    pub async fn cancel_session(&self, session_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let state = &mut *state;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        if session.status.is_terminal() {
            return Err(Error::SessionTerminal {
                id: session_id.to_string(),
                status: session.status,
            });
        }

        if let Some(control) = state.controls.get(session_id) {
            control.cancel.cancel();
            // Wake a paused worker so it sees the cancellation.
            let _ = control.resume_tx.try_send(());
        }

        session.status = SessionStatus::Canceled;
        tracing::info!(session_id = %session_id, "session canceled");
        Ok(())
    }

    /// Observe pause and cancel signals between loop iterations.
    ///
    /// Returns `Err(Canceled)` once the token fires. When a pause signal is
    /// pending, publishes `paused`, then blocks until resume or cancel;
    /// on resume the interrupted phase status is restored.
    pub(crate) async fn checkpoint(
        &self,
        session_id: &str,
        signals: &mut ControlSignals,
        previous: SessionStatus,
    ) -> Result<()> {
        if signals.cancel.is_cancelled() {
            return Err(Error::Canceled);
        }

        if signals.pause_rx.try_recv().is_ok() {
            self.set_status_if_running(session_id, SessionStatus::Paused)
                .await;
            tracing::info!(session_id = %session_id, phase = %previous, "session paused");

            tokio::select! {
                _ = signals.cancel.cancelled() => return Err(Error::Canceled),
                received = signals.resume_rx.recv() => {
                    // Cancel also signals resume to wake us; re-check before
                    // restoring the phase status over `canceled`.
                    if received.is_none() || signals.cancel.is_cancelled() {
                        return Err(Error::Canceled);
                    }
                    self.set_status_if_running(session_id, previous).await;
                    tracing::info!(session_id = %session_id, phase = %previous, "session resumed");
                }
            }
        }

        Ok(())
    }

    /// Sleep between loop iterations, waking early on cancellation.
    pub(crate) async fn sleep_cancellable(
        &self,
        delay: std::time::Duration,
        signals: &ControlSignals,
    ) -> Result<()> {
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = signals.cancel.cancelled() => Err(Error::Canceled),
        }
    }
}
