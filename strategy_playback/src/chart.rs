//! Lap-time comparison chart for the displayed strategies.
//!
//! The curve is illustrative, not a prediction: every stint starts from the
//! same reference lap and degrades linearly at a compound-dependent rate, with
//! a fixed spike on each pit lap.

use serde::{Deserialize, Serialize};

use crate::ranking::{rank, DEFAULT_TOP_N};
use crate::strategy::{Compound, Strategy, MAX_RACE_LAPS};

const REFERENCE_LAP_S: f64 = 90.0;
const DEGRADATION_PER_LAP_S: f64 = 0.05;
const PIT_SPIKE_S: f64 = 20.0;

/// Relative wear rate: softs fall off fastest.
pub fn degradation_factor(compound: Compound) -> f64 {
    match compound {
        Compound::Soft => 1.5,
        Compound::Medium => 1.0,
        Compound::Hard => 0.8,
    }
}

/// One point per stint lap, in seconds, stopping after `max_laps` points.
pub fn lap_time_series(strategy: &Strategy, max_laps: u32) -> Vec<f64> {
    let max_laps = max_laps as usize;
    let last_stint = strategy.stints.len().saturating_sub(1);
    let mut points = Vec::with_capacity(max_laps.min(strategy.stint_laps() as usize));
    for (stint_index, stint) in strategy.stints.iter().enumerate() {
        let factor = degradation_factor(stint.compound);
        for lap in 0..stint.laps {
            if points.len() >= max_laps {
                return points;
            }
            let mut time = REFERENCE_LAP_S + DEGRADATION_PER_LAP_S * factor * f64::from(lap);
            if lap + 1 == stint.laps && stint_index < last_stint {
                time += PIT_SPIKE_S;
            }
            points.push(time);
        }
    }
    points
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub label: String,
    pub lap_times: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyChart {
    /// "L1".."Ln"
    pub lap_labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl StrategyChart {
    /// Chart the top strategies, labelled like the comparison cards.
    ///
    /// The x axis runs over the race laps, at most [`MAX_RACE_LAPS`] of them;
    /// series are cut to the same length.
    pub fn build(strategies: &[Strategy], total_laps: u32) -> Self {
        let total_laps = total_laps.min(MAX_RACE_LAPS);
        let series = rank(strategies, DEFAULT_TOP_N)
            .into_iter()
            .map(|ranked| ChartSeries {
                lap_times: lap_time_series(&ranked.strategy, total_laps),
                label: ranked.label,
            })
            .collect();

        Self {
            lap_labels: (1..=total_laps).map(|lap| format!("L{}", lap)).collect(),
            series,
        }
    }
}

/// Owner of the single chart drawn for one output target.
///
/// Installing a chart hands back the previous one, so it is released before
/// the new chart is used rather than lingering as shared state.
#[derive(Debug, Default)]
pub struct ChartSlot {
    current: Option<StrategyChart>,
    generation: u64,
}

impl ChartSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, chart: StrategyChart) -> Option<StrategyChart> {
        self.generation += 1;
        self.current.replace(chart)
    }

    pub fn current(&self) -> Option<&StrategyChart> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) -> Option<StrategyChart> {
        self.current.take()
    }

    /// Number of charts installed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
