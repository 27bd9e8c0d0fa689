use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PlaybackError;

/// Longest race the playback and charting accept. Real races run well under
/// a hundred laps; anything past this is a bad request.
pub const MAX_RACE_LAPS: u32 = 1000;

/// Accept a race length in `1..=MAX_RACE_LAPS`.
pub fn check_race_laps(total_laps: u32) -> Result<u32, PlaybackError> {
    if (1..=MAX_RACE_LAPS).contains(&total_laps) {
        Ok(total_laps)
    } else {
        Err(PlaybackError::InvalidLapCount {
            total_laps,
            max: MAX_RACE_LAPS,
        })
    }
}

/// Tire compound, as sent by the strategy source ("SOFT", "MEDIUM", "HARD").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
}

impl Compound {
    pub const ALL: [Compound; 3] = [Compound::Soft, Compound::Medium, Compound::Hard];

    /// Milliseconds taken off the simulated lap; softer rubber laps faster.
    pub fn pace_bonus_ms(self) -> i64 {
        match self {
            Compound::Soft => 100,
            Compound::Medium => 50,
            Compound::Hard => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Compound::Soft => "SOFT",
            Compound::Medium => "MEDIUM",
            Compound::Hard => "HARD",
        }
    }

    /// Single-letter badge used on stint bars ("S", "M", "H").
    pub fn initial(self) -> char {
        match self {
            Compound::Soft => 'S',
            Compound::Medium => 'M',
            Compound::Hard => 'H',
        }
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous run of laps on one compound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stint {
    pub compound: Compound,
    pub laps: u32,
    // first/last lap of the stint, 1-based; the source fills these in but
    // nothing downstream needs them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_lap: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_lap: Option<u32>,
}

impl Stint {
    pub fn new(compound: Compound, laps: u32) -> Self {
        Self {
            compound,
            laps,
            start_lap: None,
            end_lap: None,
        }
    }
}

/// A computed race strategy: ordered stints plus the source's time estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub stints: Vec<Stint>,
    /// Estimated race time in seconds.
    pub total_time: f64,
    pub pit_stops: u32,
}

impl Strategy {
    /// Build a strategy with one pit stop between each pair of stints.
    pub fn new(stints: Vec<Stint>, total_time: f64) -> Self {
        let pit_stops = stints.len().saturating_sub(1) as u32;
        Self {
            stints,
            total_time,
            pit_stops,
        }
    }

    /// Sum of the stint lengths, saturating at `u32::MAX`.
    pub fn stint_laps(&self) -> u32 {
        self.stints
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.laps))
    }

    pub fn pit_stops_consistent(&self) -> bool {
        self.pit_stops as usize == self.stints.len().saturating_sub(1)
    }
}
