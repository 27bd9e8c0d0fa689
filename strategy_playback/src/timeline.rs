use std::collections::BTreeSet;

use crate::error::PlaybackError;
use crate::strategy::{Compound, Stint};

/// Per-lap view of a strategy: which compound is on the car for every lap and
/// after which laps the car pits.
///
/// Stored as stint runs rather than one entry per lap, so lookups cost
/// `O(log stints)` and memory does not grow with lap counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LapTimeline {
    /// `(last lap of the stint, compound)`, 1-based and ascending. Zero-lap
    /// stints are left out.
    runs: Vec<(u32, Compound)>,
    /// 1-based lap numbers immediately followed by a tire change.
    pit_after_lap: BTreeSet<u32>,
}

/// Flatten `stints` into a lap timeline.
///
/// Each stint's compound covers the next `laps` laps, in order. A pit marker
/// is placed at the cumulative lap count after every stint except the last
/// one. Never fails: a single stint gives no pit markers, an empty stint list
/// gives an empty timeline and lap sums saturate at `u32::MAX`.
pub fn expand(stints: &[Stint], _total_laps: u32) -> LapTimeline {
    let mut runs = Vec::with_capacity(stints.len());
    let mut pit_after_lap = BTreeSet::new();
    let mut cumulative = 0u32;
    let last = stints.len().saturating_sub(1);

    for (i, stint) in stints.iter().enumerate() {
        cumulative = cumulative.saturating_add(stint.laps);
        if stint.laps > 0 {
            runs.push((cumulative, stint.compound));
        }
        if i < last {
            pit_after_lap.insert(cumulative);
        }
    }

    LapTimeline {
        runs,
        pit_after_lap,
    }
}

impl LapTimeline {
    /// Laps covered by the stints.
    pub fn covered_laps(&self) -> u32 {
        self.runs.last().map_or(0, |&(end, _)| end)
    }

    pub fn len(&self) -> usize {
        self.covered_laps() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn pit_after_lap(&self) -> &BTreeSet<u32> {
        &self.pit_after_lap
    }

    /// Compound for a 0-based lap index. Indexes past the end clamp to the
    /// last stint's compound; `None` only for an empty timeline.
    pub fn compound_at(&self, lap_index: usize) -> Option<Compound> {
        let lap_index = lap_index as u64;
        let run = self
            .runs
            .partition_point(|&(end, _)| u64::from(end) <= lap_index);
        self.runs.get(run).or(self.runs.last()).map(|&(_, c)| c)
    }

    /// Compound for a 1-based lap number, clamped like [`compound_at`](Self::compound_at).
    pub fn compound_for_lap(&self, lap_number: u32) -> Option<Compound> {
        self.compound_at(lap_number.saturating_sub(1) as usize)
    }

    pub fn is_pit_lap(&self, lap_number: u32) -> bool {
        self.pit_after_lap.contains(&lap_number)
    }

    /// Report whether the stints cover exactly `total_laps`.
    ///
    /// A mismatch is a diagnostic, not a failure: playback clamps lookups and
    /// carries on.
    pub fn check(&self, total_laps: u32) -> Result<(), PlaybackError> {
        let stint_laps = self.covered_laps();
        if stint_laps == total_laps {
            Ok(())
        } else {
            Err(PlaybackError::MalformedStrategy {
                stint_laps,
                total_laps,
            })
        }
    }
}
