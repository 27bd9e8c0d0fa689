//! Strategy playback: replays a computed pit-stop strategy lap by lap as a
//! time-accelerated, cancellable sequence of display updates.
//!
//! The pipeline is `Strategy -> LapTimeline -> PlaybackSession -> DisplayState`:
//! [`timeline::expand`] flattens stints into per-lap compounds, the
//! [`timing::LapTimingModel`] decides how long each simulated lap lasts, the
//! [`scheduler`] drives the session one step at a time and
//! [`projection::project`] turns each step into what an observer shows.

pub mod chart;
pub mod config;
pub mod error;
pub mod projection;
pub mod ranking;
pub mod scheduler;
pub mod source;
pub mod strategy;
pub mod summary;
pub mod timeline;
pub mod timing;

pub use chart::{ChartSlot, StrategyChart};
pub use config::{PlaybackConfig, TimingConfig};
pub use error::PlaybackError;
pub use projection::{project, DisplayState, LapStatus, LapUpdate, TireColor};
pub use ranking::{rank, select_top, RankedStrategy, DEFAULT_TOP_N};
pub use scheduler::{
    run_playback, CancelToken, Liveness, PlaybackEvent, PlaybackHandle, PlaybackObserver,
    PlaybackScheduler, PlaybackSession, SessionState, StepOutcome,
};
pub use source::{SourceError, StrategyRequest, StrategySource};
pub use strategy::{check_race_laps, Compound, Stint, Strategy, MAX_RACE_LAPS};
pub use summary::{SaveStrategyRequest, StintSegment, StrategyCard};
pub use timeline::{expand, LapTimeline};
pub use timing::{LapTimingModel, StepDuration};
