use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;
use crate::strategy::Strategy;

/// How many strategies the viewer compares side by side.
pub const DEFAULT_TOP_N: usize = 3;

/// A strategy with its display position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStrategy {
    /// 0-based position in the source's order.
    pub rank: usize,
    pub label: String,
    pub strategy: Strategy,
}

/// "Recommended" for the first strategy, "Option N" (1-based) for the rest.
pub fn rank_label(index: usize) -> String {
    if index == 0 {
        "Recommended".to_string()
    } else {
        format!("Option {}", index + 1)
    }
}

/// First `n` strategies in the order they arrived. The source owns the
/// ordering; nothing is re-sorted here.
pub fn select_top(strategies: &[Strategy], n: usize) -> Vec<Strategy> {
    strategies.iter().take(n).cloned().collect()
}

/// [`select_top`] with rank labels attached.
pub fn rank(strategies: &[Strategy], n: usize) -> Vec<RankedStrategy> {
    select_top(strategies, n)
        .into_iter()
        .enumerate()
        .map(|(rank, strategy)| RankedStrategy {
            rank,
            label: rank_label(rank),
            strategy,
        })
        .collect()
}

/// The top-ranked strategy, for callers that need exactly one.
pub fn recommended(ranked: &[RankedStrategy]) -> Result<&RankedStrategy, PlaybackError> {
    ranked.first().ok_or(PlaybackError::NoStrategiesAvailable)
}
