use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Constants of the lap timing model, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Fixed part of every simulated lap.
    pub base_ms: i64,
    /// Pace portion before the compound bonus is taken off.
    pub pace_ceiling_ms: i64,
    /// The pace portion never drops below this.
    pub pace_floor_ms: i64,
    /// Jitter is drawn from `[-jitter_ms, jitter_ms]`.
    pub jitter_ms: i64,
    pub min_lap_ms: i64,
    /// On-track time is divided by this.
    pub acceleration: i64,
    pub min_accelerated_ms: i64,
    /// Pit penalty is drawn from `[pit_min_ms, pit_max_ms)` and never accelerated.
    pub pit_min_ms: i64,
    pub pit_max_ms: i64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_ms: 400,
            pace_ceiling_ms: 800,
            pace_floor_ms: 100,
            jitter_ms: 100,
            min_lap_ms: 200,
            acceleration: 10,
            min_accelerated_ms: 50,
            pit_min_ms: 1200,
            pit_max_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Delay before the first lap, so the consumer can finish its own setup.
    pub warmup_ms: u64,
    pub timing: TimingConfig,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            warmup_ms: 300,
            timing: TimingConfig::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }
}
