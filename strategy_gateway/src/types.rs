use serde::Deserialize;
use strategy_playback::{check_race_laps, PlaybackError, StrategyRequest};

/// Query string of `/strategy`, named the way the viewer's form sends it.
/// Missing parameters take the defaults of [`StrategyRequest`]; a lap count
/// outside `1..=MAX_RACE_LAPS` is refused.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyQuery {
    pub circuit: Option<String>,
    pub laps: Option<u32>,
    pub air_temp: Option<f64>,
    pub track_temp: Option<f64>,
}

impl StrategyQuery {
    pub fn into_request(self) -> Result<StrategyRequest, PlaybackError> {
        let defaults = StrategyRequest::default();
        Ok(StrategyRequest {
            circuit: self.circuit.unwrap_or(defaults.circuit),
            total_laps: check_race_laps(self.laps.unwrap_or(defaults.total_laps))?,
            air_temp: self.air_temp.unwrap_or(defaults.air_temp),
            track_temp: self.track_temp.unwrap_or(defaults.track_temp),
        })
    }
}
