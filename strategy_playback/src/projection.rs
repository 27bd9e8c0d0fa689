use serde::{Deserialize, Serialize};

use crate::strategy::Compound;

/// Shortest visual emphasis a consumer should give a lap, even when the
/// accelerated step itself is shorter.
pub const MIN_EMPHASIS_MS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LapStatus {
    InProgress,
    PitStop,
}

impl LapStatus {
    pub fn from_pit(did_pit: bool) -> Self {
        if did_pit {
            LapStatus::PitStop
        } else {
            LapStatus::InProgress
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LapStatus::InProgress => "On track",
            LapStatus::PitStop => "Pit Stop",
        }
    }
}

/// One simulated lap, as produced by a playback step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapUpdate {
    pub lap_number: u32,
    pub compound: Compound,
    pub status: LapStatus,
    pub step_duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TireColor {
    Red,
    Yellow,
    White,
}

impl From<Compound> for TireColor {
    fn from(compound: Compound) -> Self {
        match compound {
            Compound::Soft => TireColor::Red,
            Compound::Medium => TireColor::Yellow,
            Compound::Hard => TireColor::White,
        }
    }
}

/// What an observer renders for a lap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayState {
    /// Race completion, 0..=100.
    pub percentage: f64,
    pub color: TireColor,
    pub lap_label: String,
    pub status_label: String,
    pub emphasis_ms: u64,
}

pub fn project(update: &LapUpdate, total_laps: u32) -> DisplayState {
    let percentage = if total_laps == 0 {
        100.0
    } else {
        (f64::from(update.lap_number) / f64::from(total_laps) * 100.0).min(100.0)
    };

    DisplayState {
        percentage,
        color: update.compound.into(),
        lap_label: format!("Lap {}/{}", update.lap_number, total_laps),
        status_label: update.status.label().to_string(),
        emphasis_ms: update.step_duration_ms.max(MIN_EMPHASIS_MS),
    }
}
