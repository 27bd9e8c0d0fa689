use thiserror::Error;

use crate::scheduler::SessionState;

/// Conditions the playback core reports. None of them is fatal: callers log
/// them and keep going with a best-effort visual approximation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("strategy stints cover {stint_laps} laps but the race has {total_laps}")]
    MalformedStrategy { stint_laps: u32, total_laps: u32 },

    #[error("race length {total_laps} is outside 1..={max} laps")]
    InvalidLapCount { total_laps: u32, max: u32 },

    #[error("no strategies available")]
    NoStrategiesAvailable,

    #[error("playback session already terminated ({0:?})")]
    SessionAlreadyTerminated(SessionState),
}
