use serde::{Deserialize, Serialize};

use crate::projection::TireColor;
use crate::ranking::RankedStrategy;
use crate::strategy::{Compound, Stint, Strategy};

/// `"{minutes}m {seconds:.2}s"`, e.g. 5423.456 -> `"90m 23.46s"`.
pub fn format_total_time(total_seconds: f64) -> String {
    let total_seconds = total_seconds.max(0.0);
    let minutes = (total_seconds / 60.0).floor();
    let seconds = total_seconds - minutes * 60.0;
    format!("{}m {:.2}s", minutes as u64, seconds)
}

/// `"SOFT (18) -> MEDIUM (20) -> HARD (19)"`
pub fn stints_description(stints: &[Stint]) -> String {
    stints
        .iter()
        .map(|s| format!("{} ({})", s.compound, s.laps))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// One block of a stint bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StintSegment {
    pub compound: Compound,
    pub laps: u32,
    /// Share of the race, in percent of `total_laps`.
    pub share_pct: f64,
    pub color: TireColor,
    pub badge: char,
}

pub fn stint_segments(strategy: &Strategy, total_laps: u32) -> Vec<StintSegment> {
    strategy
        .stints
        .iter()
        .map(|s| StintSegment {
            compound: s.compound,
            laps: s.laps,
            share_pct: if total_laps == 0 {
                0.0
            } else {
                f64::from(s.laps) / f64::from(total_laps) * 100.0
            },
            color: s.compound.into(),
            badge: s.compound.initial(),
        })
        .collect()
}

/// A comparison card for one ranked strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyCard {
    pub rank: usize,
    pub rank_label: String,
    pub total_time_label: String,
    pub pit_stops: u32,
    pub segments: Vec<StintSegment>,
    pub stints_description: String,
    pub strategy: Strategy,
}

impl StrategyCard {
    pub fn build(ranked: RankedStrategy, total_laps: u32) -> Self {
        let strategy = ranked.strategy;
        Self {
            rank: ranked.rank,
            rank_label: ranked.label,
            total_time_label: format_total_time(strategy.total_time),
            pit_stops: strategy.pit_stops,
            segments: stint_segments(&strategy, total_laps),
            stints_description: stints_description(&strategy.stints),
            strategy,
        }
    }
}

/// Body the persistence collaborator accepts when a strategy is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStrategyRequest {
    pub circuit: String,
    pub total_time: f64,
    pub pit_stops: u32,
    pub stints_description: String,
}

impl SaveStrategyRequest {
    pub fn from_strategy(circuit: &str, strategy: &Strategy) -> Self {
        Self {
            circuit: circuit.to_string(),
            total_time: strategy.total_time,
            pit_stops: strategy.pit_stops,
            stints_description: stints_description(&strategy.stints),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::rank;

    fn two_stop() -> Strategy {
        Strategy::new(
            vec![
                Stint::new(Compound::Soft, 18),
                Stint::new(Compound::Medium, 20),
                Stint::new(Compound::Hard, 19),
            ],
            5423.456,
        )
    }

    #[test]
    fn test_format_total_time() {
        assert_eq!(format_total_time(5423.456), "90m 23.46s");
        assert_eq!(format_total_time(59.999), "0m 60.00s");
        assert_eq!(format_total_time(120.0), "2m 0.00s");
        assert_eq!(format_total_time(-3.0), "0m 0.00s");
    }

    #[test]
    fn test_description_and_save_payload() {
        let s = two_stop();
        assert_eq!(
            stints_description(&s.stints),
            "SOFT (18) -> MEDIUM (20) -> HARD (19)"
        );
        let payload = SaveStrategyRequest::from_strategy("Bahrain Grand Prix", &s);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["circuit"], "Bahrain Grand Prix");
        assert_eq!(json["pitStops"], 2);
        assert_eq!(json["stintsDescription"], "SOFT (18) -> MEDIUM (20) -> HARD (19)");
    }

    #[test]
    fn test_segments() {
        let segments = stint_segments(&two_stop(), 57);
        assert_eq!(segments.len(), 3);
        let total: f64 = segments.iter().map(|s| s.share_pct).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(segments[1].color, TireColor::Yellow);
        assert_eq!(segments[2].badge, 'H');
    }

    #[test]
    fn test_card() {
        let ranked = rank(&[two_stop()], 3).remove(0);
        let card = StrategyCard::build(ranked, 57);
        assert_eq!(card.rank_label, "Recommended");
        assert_eq!(card.total_time_label, "90m 23.46s");
        assert_eq!(card.pit_stops, 2);
    }
}
