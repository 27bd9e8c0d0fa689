use rand::Rng;

use crate::config::TimingConfig;
use crate::strategy::Compound;

/// How long one playback step lasts on the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDuration {
    pub duration_ms: u64,
    pub did_pit: bool,
}

/// Turns a lap's compound and pit flag into a playback delay.
///
/// The on-track part is jittered and then compressed by the acceleration
/// factor; the pit penalty is added afterwards at full length so a stop reads
/// as a distinct, slower event.
#[derive(Debug, Clone, Default)]
pub struct LapTimingModel {
    config: TimingConfig,
}

impl LapTimingModel {
    pub fn new(config: TimingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    /// Simulated on-track lap before jitter and acceleration.
    pub fn base_ms(&self, compound: Compound) -> i64 {
        let c = &self.config;
        c.base_ms + (c.pace_ceiling_ms - compound.pace_bonus_ms()).max(c.pace_floor_ms)
    }

    pub fn step_duration<R: Rng>(
        &self,
        compound: Compound,
        is_pit_lap: bool,
        rng: &mut R,
    ) -> StepDuration {
        let c = &self.config;

        let jitter = if c.jitter_ms > 0 {
            rng.gen_range(-c.jitter_ms..=c.jitter_ms)
        } else {
            0
        };
        let lap_ms = (self.base_ms(compound) + jitter).max(c.min_lap_ms);
        let accelerated_ms = (lap_ms / c.acceleration.max(1)).max(c.min_accelerated_ms);

        let pit_ms = if !is_pit_lap {
            0
        } else if c.pit_max_ms > c.pit_min_ms {
            rng.gen_range(c.pit_min_ms..c.pit_max_ms)
        } else {
            c.pit_min_ms
        };

        StepDuration {
            duration_ms: (accelerated_ms + pit_ms).max(1) as u64,
            did_pit: is_pit_lap,
        }
    }
}
