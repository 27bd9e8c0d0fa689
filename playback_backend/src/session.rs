use std::sync::atomic::{AtomicU64, Ordering};
use strategy_playback::{check_race_laps, PlaybackHandle, PlaybackScheduler, Strategy};
use tokio::sync::mpsc::UnboundedSender;

use crate::model::{ClientMessage, Notice, Outgoing, SessionSink};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Playback sessions of one viewer connection.
///
/// At most one session runs at a time: a new `start` cancels the running one,
/// and dropping this value (the viewer went away) cancels it too.
pub struct ViewerSessions {
    scheduler: PlaybackScheduler,
    tx: UnboundedSender<Outgoing>,
    current: Option<(u64, PlaybackHandle)>,
}

impl ViewerSessions {
    pub fn new(scheduler: PlaybackScheduler, tx: UnboundedSender<Outgoing>) -> Self {
        Self {
            scheduler,
            tx,
            current: None,
        }
    }

    /// Id of the session started last, unless it was cancelled since.
    pub fn current_session(&self) -> Option<u64> {
        self.current.as_ref().map(|(id, _)| *id)
    }

    /// Handle one text frame from the viewer. Malformed input is logged and dropped.
    pub fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle(msg),
            Err(e) => tracing::warn!("ignoring malformed message: {}", e),
        }
    }

    pub fn handle(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::Start {
                strategy,
                total_laps,
            } => self.start(&strategy, total_laps),
            ClientMessage::Cancel => self.cancel_current(),
        }
    }

    fn start(&mut self, strategy: &Strategy, total_laps: u32) {
        // one session per viewer: the previous one stops at its next step
        self.cancel_current();

        if let Err(e) = check_race_laps(total_laps) {
            tracing::warn!("refusing start: {}", e);
            let _ = self.tx.send(Outgoing::Notice(Notice::Rejected {
                error: e.to_string(),
            }));
            return;
        }

        let sink = SessionSink {
            session: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            tx: self.tx.clone(),
        };
        let session = sink.session;
        tracing::info!(
            "session {} starting: {} stints over {} laps",
            session,
            strategy.stints.len(),
            total_laps
        );
        let handle = self.scheduler.start_playback(strategy, total_laps, sink);
        self.current = Some((session, handle));
    }

    pub fn cancel_current(&mut self) {
        if let Some((session, handle)) = self.current.take() {
            tracing::debug!("cancelling session {}", session);
            handle.cancel();
        }
    }
}

impl Drop for ViewerSessions {
    fn drop(&mut self) {
        self.cancel_current();
    }
}
