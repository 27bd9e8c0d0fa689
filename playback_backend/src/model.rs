use serde::{Deserialize, Serialize};
use strategy_playback::{PlaybackEvent, PlaybackObserver, Strategy};
use tokio::sync::mpsc::UnboundedSender;

/// What a viewer sends over the socket.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Start { strategy: Strategy, total_laps: u32 },
    Cancel,
}

/// What the viewer receives: a playback event tagged with the session that
/// produced it, so frames from a just-replaced session can be told apart.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ServerFrame {
    pub session: u64,
    #[serde(flatten)]
    pub event: PlaybackEvent,
}

/// Connection-level notices that belong to no session.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Notice {
    /// A `start` that was refused; no session was created for it.
    Rejected { error: String },
}

/// Anything the connection writer puts on the socket.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Outgoing {
    Frame(ServerFrame),
    Notice(Notice),
}

/// Observer that forwards one session's events to the connection writer.
pub struct SessionSink {
    pub session: u64,
    pub tx: UnboundedSender<Outgoing>,
}

impl PlaybackObserver for SessionSink {
    fn on_event(&mut self, event: PlaybackEvent) {
        if let PlaybackEvent::Lap { update, display: lap_display } = &event {
            tracing::debug!(
                "[ lap ] session={} lap={} compound={} status={} pct={:.1} step={}ms",
                self.session,
                update.lap_number,
                update.compound,
                lap_display.status_label,
                lap_display.percentage,
                update.step_duration_ms
            );
        }
        let _ = self.tx.send(Outgoing::Frame(ServerFrame {
            session: self.session,
            event,
        }));
    }

    // the writer drops its receiver when the socket is gone
    fn is_attached(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"start","totalLaps":57,"strategy":{
                "stints":[{"compound":"SOFT","laps":18},{"compound":"HARD","laps":39}],
                "totalTime":5430.2,"pitStops":1}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Start {
                strategy,
                total_laps,
            } => {
                assert_eq!(total_laps, 57);
                assert_eq!(strategy.stints.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            serde_json::from_str::<ClientMessage>(r#"{"type":"cancel"}"#).unwrap(),
            ClientMessage::Cancel
        ));
    }

    #[test]
    fn test_frame_is_flat() {
        let frame = ServerFrame {
            session: 3,
            event: PlaybackEvent::Completed { total_laps: 57 },
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["session"], 3);
        assert_eq!(json["event"], "completed");
        assert_eq!(json["totalLaps"], 57);
    }

    #[test]
    fn test_rejection_is_flat() {
        let json = serde_json::to_value(Outgoing::Notice(Notice::Rejected {
            error: "bad laps".into(),
        }))
        .unwrap();
        assert_eq!(json["event"], "rejected");
        assert_eq!(json["error"], "bad laps");
        assert!(json.get("session").is_none());
    }

    #[test]
    fn test_sink_tags_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink = SessionSink { session: 9, tx };
        assert!(sink.is_attached());
        sink.on_event(PlaybackEvent::Started { total_laps: 3 });
        assert_eq!(
            rx.try_recv().unwrap(),
            Outgoing::Frame(ServerFrame {
                session: 9,
                event: PlaybackEvent::Started { total_laps: 3 },
            })
        );
        drop(rx);
        assert!(!sink.is_attached());
    }
}
