//! Playback scheduler.
//!
//! A [`PlaybackSession`] is a small state machine
//! (`NotStarted -> Running -> Completed | Cancelled`) that advances one lap per
//! [`step`](PlaybackSession::step) and tells its driver how long to wait before
//! the next one. [`run_playback`] drives a session on the tokio timer;
//! [`PlaybackScheduler::start_playback`] spawns that as a task behind a
//! [`CancelToken`].
//!
//! Cancellation is cooperative: at the top of every step the session polls its
//! liveness predicate and asks the observer whether anyone still receives its
//! events. Either answering "no" cancels it; nothing else stops a session.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::error::PlaybackError;
use crate::projection::{project, DisplayState, LapStatus, LapUpdate};
use crate::strategy::Strategy;
use crate::timeline::{expand, LapTimeline};
use crate::timing::LapTimingModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    NotStarted,
    Running,
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

/// Caller-supplied answer to "is this session's output still wanted?".
///
/// Evaluated at the start of every step; implementations must not cache.
pub trait Liveness: Send {
    fn is_live(&self) -> bool;
}

impl<F> Liveness for F
where
    F: Fn() -> bool + Send,
{
    fn is_live(&self) -> bool {
        self()
    }
}

/// Cloneable cancellation flag. Live until [`cancel`](CancelToken::cancel) is called.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Liveness for CancelToken {
    fn is_live(&self) -> bool {
        !self.is_cancelled()
    }
}

/// Everything a session tells its observer, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlaybackEvent {
    Started { total_laps: u32 },
    Lap { update: LapUpdate, display: DisplayState },
    /// `last_lap` is the last lap emitted before cancellation, if any.
    Cancelled { last_lap: Option<u32> },
    Completed { total_laps: u32 },
}

/// The single subscription point of a playback session.
pub trait PlaybackObserver: Send {
    fn on_event(&mut self, event: PlaybackEvent);

    /// Whether events still reach anyone. A detached observer cancels the
    /// session at its next step.
    fn is_attached(&self) -> bool {
        true
    }
}

impl PlaybackObserver for UnboundedSender<PlaybackEvent> {
    fn on_event(&mut self, event: PlaybackEvent) {
        // a closed receiver shows up through is_attached on the next step
        let _ = self.send(event);
    }

    fn is_attached(&self) -> bool {
        !self.is_closed()
    }
}

impl PlaybackObserver for Vec<PlaybackEvent> {
    fn on_event(&mut self, event: PlaybackEvent) {
        self.push(event);
    }
}

/// Result of a single [`PlaybackSession::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A lap was emitted; step again after this delay.
    Scheduled(Duration),
    Completed,
    Cancelled,
    /// The session was not running; nothing happened.
    Ignored,
}

/// One playback run of one strategy. Owns its timeline, position and RNG.
pub struct PlaybackSession<L> {
    timeline: LapTimeline,
    total_laps: u32,
    current_lap_index: u32,
    state: SessionState,
    liveness: L,
    timing: LapTimingModel,
    warmup: Duration,
    rng: StdRng,
}

impl<L: Liveness> PlaybackSession<L> {
    pub fn new(strategy: &Strategy, total_laps: u32, liveness: L, config: &PlaybackConfig) -> Self {
        Self {
            timeline: expand(&strategy.stints, total_laps),
            total_laps,
            current_lap_index: 0,
            state: SessionState::NotStarted,
            liveness,
            timing: LapTimingModel::new(config.timing.clone()),
            warmup: config.warmup(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the entropy-seeded RNG, for reproducible jitter.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_lap_index(&self) -> u32 {
        self.current_lap_index
    }

    pub fn total_laps(&self) -> u32 {
        self.total_laps
    }

    pub fn timeline(&self) -> &LapTimeline {
        &self.timeline
    }

    /// Leave `NotStarted`. Returns the warm-up delay before the first step,
    /// or `None` if there is nothing to play (or the session already left
    /// `NotStarted`).
    pub fn start(&mut self, observer: &mut dyn PlaybackObserver) -> Option<Duration> {
        if self.state != SessionState::NotStarted {
            debug!(state = ?self.state, "start ignored");
            return None;
        }

        if let Err(e) = self.timeline.check(self.total_laps) {
            warn!(error = %e, "playing malformed strategy with clamped compounds");
        }

        self.state = SessionState::Running;
        observer.on_event(PlaybackEvent::Started {
            total_laps: self.total_laps,
        });
        info!(
            total_laps = self.total_laps,
            pit_laps = ?self.timeline.pit_after_lap(),
            "playback started"
        );

        if self.total_laps == 0 || self.timeline.is_empty() {
            self.finish(observer);
            return None;
        }
        Some(self.warmup)
    }

    /// Run one lap. A step on a session that is not running is a no-op.
    pub fn step(&mut self, observer: &mut dyn PlaybackObserver) -> StepOutcome {
        if self.state != SessionState::Running {
            if self.state.is_terminal() {
                debug!(error = %PlaybackError::SessionAlreadyTerminated(self.state), "step ignored");
            }
            return StepOutcome::Ignored;
        }

        if !self.wanted(observer) {
            self.cancel(observer);
            return StepOutcome::Cancelled;
        }

        let lap_number = self.current_lap_index + 1;
        let Some(compound) = self.timeline.compound_at(self.current_lap_index as usize) else {
            self.finish(observer);
            return StepOutcome::Completed;
        };
        let is_pit_lap = self.timeline.is_pit_lap(lap_number);
        let step = self
            .timing
            .step_duration(compound, is_pit_lap, &mut self.rng);

        let update = LapUpdate {
            lap_number,
            compound,
            status: LapStatus::from_pit(step.did_pit),
            step_duration_ms: step.duration_ms,
        };
        let display = project(&update, self.total_laps);
        debug!(lap = lap_number, %compound, pit = step.did_pit, ms = step.duration_ms, "lap");
        observer.on_event(PlaybackEvent::Lap { update, display });

        self.current_lap_index += 1;
        if self.current_lap_index >= self.total_laps {
            self.finish(observer);
            return StepOutcome::Completed;
        }
        if !self.wanted(observer) {
            self.cancel(observer);
            return StepOutcome::Cancelled;
        }
        StepOutcome::Scheduled(Duration::from_millis(step.duration_ms))
    }

    fn wanted(&self, observer: &dyn PlaybackObserver) -> bool {
        self.liveness.is_live() && observer.is_attached()
    }

    fn cancel(&mut self, observer: &mut dyn PlaybackObserver) {
        self.state = SessionState::Cancelled;
        let last_lap = (self.current_lap_index > 0).then_some(self.current_lap_index);
        info!(?last_lap, "playback cancelled");
        observer.on_event(PlaybackEvent::Cancelled { last_lap });
    }

    fn finish(&mut self, observer: &mut dyn PlaybackObserver) {
        self.state = SessionState::Completed;
        info!(total_laps = self.total_laps, "playback completed");
        observer.on_event(PlaybackEvent::Completed {
            total_laps: self.total_laps,
        });
    }
}

/// Drive `session` to a terminal state on the tokio timer, sleeping for each
/// step's duration in between. Returns the final state.
pub async fn run_playback<L, O>(mut session: PlaybackSession<L>, mut observer: O) -> SessionState
where
    L: Liveness,
    O: PlaybackObserver,
{
    let mut next = session.start(&mut observer);
    while let Some(delay) = next {
        tokio::time::sleep(delay).await;
        next = match session.step(&mut observer) {
            StepOutcome::Scheduled(delay) => Some(delay),
            _ => None,
        };
    }
    session.state()
}

/// A spawned playback session.
pub struct PlaybackHandle {
    token: CancelToken,
    task: JoinHandle<SessionState>,
}

impl PlaybackHandle {
    /// Ask the session to stop; it does so at its next step.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to reach a terminal state.
    pub async fn join(self) -> SessionState {
        match self.task.await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "playback task did not finish");
                SessionState::Cancelled
            }
        }
    }
}

/// Creates independent playback sessions sharing one configuration.
#[derive(Debug, Clone, Default)]
pub struct PlaybackScheduler {
    config: PlaybackConfig,
}

impl PlaybackScheduler {
    pub fn new(config: PlaybackConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn session<L: Liveness>(
        &self,
        strategy: &Strategy,
        total_laps: u32,
        liveness: L,
    ) -> PlaybackSession<L> {
        PlaybackSession::new(strategy, total_laps, liveness, &self.config)
    }

    /// Spawn a new session on the current tokio runtime. Each call is fully
    /// independent of any other running session.
    pub fn start_playback<O>(&self, strategy: &Strategy, total_laps: u32, observer: O) -> PlaybackHandle
    where
        O: PlaybackObserver + 'static,
    {
        let token = CancelToken::new();
        let session = self.session(strategy, total_laps, token.clone());
        PlaybackHandle {
            token,
            task: tokio::spawn(run_playback(session, observer)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{Compound, Stint};
    use std::sync::atomic::AtomicU32;

    fn two_stop() -> Strategy {
        Strategy::new(
            vec![
                Stint::new(Compound::Soft, 18),
                Stint::new(Compound::Medium, 20),
                Stint::new(Compound::Hard, 19),
            ],
            5423.4,
        )
    }

    fn laps(events: &[PlaybackEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Lap { update, .. } => Some(update.lap_number),
                _ => None,
            })
            .collect()
    }

    /// Step a session to the end without sleeping.
    fn drain<L: Liveness>(session: &mut PlaybackSession<L>, events: &mut Vec<PlaybackEvent>) {
        let mut next = session.start(events);
        while next.is_some() {
            next = match session.step(events) {
                StepOutcome::Scheduled(d) => Some(d),
                _ => None,
            };
        }
    }

    #[test]
    fn test_full_run_emits_every_lap_in_order() {
        let mut session =
            PlaybackSession::new(&two_stop(), 57, || true, &PlaybackConfig::default()).with_seed(3);
        let mut events = Vec::new();
        drain(&mut session, &mut events);

        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(laps(&events), (1..=57).collect::<Vec<_>>());
        assert_eq!(events.first(), Some(&PlaybackEvent::Started { total_laps: 57 }));
        assert_eq!(events.last(), Some(&PlaybackEvent::Completed { total_laps: 57 }));

        let pits: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Lap { update, .. } if update.status == LapStatus::PitStop => {
                    Some(update.lap_number)
                }
                _ => None,
            })
            .collect();
        assert_eq!(pits, vec![18, 38]);
    }

    #[test]
    fn test_start_returns_warmup_once() {
        let mut session =
            PlaybackSession::new(&two_stop(), 57, || true, &PlaybackConfig::default());
        assert_eq!(session.total_laps(), 57);
        assert_eq!(session.timeline().len(), 57);
        let mut events = Vec::new();
        assert_eq!(session.start(&mut events), Some(Duration::from_millis(300)));
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.start(&mut events), None);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_step_before_start_is_ignored() {
        let mut session =
            PlaybackSession::new(&two_stop(), 57, || true, &PlaybackConfig::default());
        let mut events = Vec::new();
        assert_eq!(session.step(&mut events), StepOutcome::Ignored);
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(events.is_empty());
    }

    #[test]
    fn test_liveness_polled_every_step() {
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();
        // live for the first 5 polls (start of laps 1..=3 plus the two
        // post-emission checks in between), dead afterwards
        let liveness = move || counter.fetch_add(1, Ordering::SeqCst) < 5;
        let mut session =
            PlaybackSession::new(&two_stop(), 57, liveness, &PlaybackConfig::default());
        let mut events = Vec::new();
        drain(&mut session, &mut events);

        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(laps(&events), vec![1, 2, 3]);
        assert_eq!(
            events.last(),
            Some(&PlaybackEvent::Cancelled { last_lap: Some(3) })
        );
    }

    #[test]
    fn test_cancel_before_first_lap() {
        let token = CancelToken::new();
        let mut session =
            PlaybackSession::new(&two_stop(), 57, token.clone(), &PlaybackConfig::default());
        let mut events = Vec::new();
        assert!(session.start(&mut events).is_some());
        token.cancel();
        assert_eq!(session.step(&mut events), StepOutcome::Cancelled);
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Started { total_laps: 57 },
                PlaybackEvent::Cancelled { last_lap: None }
            ]
        );
        // terminated sessions stay quiet
        assert_eq!(session.step(&mut events), StepOutcome::Ignored);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_zero_laps_completes_without_updates() {
        let mut session =
            PlaybackSession::new(&two_stop(), 0, || true, &PlaybackConfig::default());
        let mut events = Vec::new();
        assert_eq!(session.start(&mut events), None);
        assert_eq!(session.state(), SessionState::Completed);
        assert!(laps(&events).is_empty());
    }

    #[test]
    fn test_short_strategy_plays_full_race() {
        let strategy = Strategy::new(vec![Stint::new(Compound::Soft, 3)], 0.0);
        let mut session =
            PlaybackSession::new(&strategy, 6, || true, &PlaybackConfig::default());
        let mut events = Vec::new();
        drain(&mut session, &mut events);
        assert_eq!(laps(&events), vec![1, 2, 3, 4, 5, 6]);
        assert!(events.iter().all(|e| match e {
            PlaybackEvent::Lap { update, .. } => update.compound == Compound::Soft,
            _ => true,
        }));
    }

    struct Detaching {
        events: Vec<PlaybackEvent>,
        attached_for: usize,
    }

    impl PlaybackObserver for Detaching {
        fn on_event(&mut self, event: PlaybackEvent) {
            self.events.push(event);
        }

        fn is_attached(&self) -> bool {
            // detaches once it has seen `attached_for` laps
            self.events.len() <= self.attached_for
        }
    }

    #[test]
    fn test_detached_observer_cancels() {
        let mut session =
            PlaybackSession::new(&two_stop(), 57, || true, &PlaybackConfig::default());
        let mut observer = Detaching {
            events: Vec::new(),
            attached_for: 4,
        };
        assert!(session.start(&mut observer).is_some());
        let mut outcomes = Vec::new();
        loop {
            let outcome = session.step(&mut observer);
            outcomes.push(outcome);
            if !matches!(outcome, StepOutcome::Scheduled(_)) {
                break;
            }
        }
        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(outcomes.last(), Some(&StepOutcome::Cancelled));
        assert_eq!(laps(&observer.events), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_scheduler_hands_its_config_to_sessions() {
        let config = PlaybackConfig {
            warmup_ms: 0,
            ..PlaybackConfig::default()
        };
        let scheduler = PlaybackScheduler::new(config.clone());
        assert_eq!(scheduler.config(), &config);

        let mut session = scheduler.session(&two_stop(), 57, || true);
        assert_eq!(session.timing.config(), &config.timing);
        let mut events: Vec<PlaybackEvent> = Vec::new();
        assert_eq!(session.start(&mut events), Some(Duration::ZERO));
    }

    #[test]
    fn test_event_wire_shape() {
        let json = serde_json::to_value(PlaybackEvent::Cancelled { last_lap: Some(4) }).unwrap();
        assert_eq!(json["event"], "cancelled");
        assert_eq!(json["lastLap"], 4);
        let json = serde_json::to_value(PlaybackEvent::Started { total_laps: 57 }).unwrap();
        assert_eq!(json["totalLaps"], 57);
    }
}
