use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategy::Strategy;

/// Race parameters sent to the strategy source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRequest {
    pub circuit: String,
    pub total_laps: u32,
    /// Celsius.
    pub air_temp: f64,
    /// Celsius.
    pub track_temp: f64,
}

impl Default for StrategyRequest {
    fn default() -> Self {
        Self {
            circuit: "Bahrain Grand Prix".to_string(),
            total_laps: 57,
            air_temp: 30.0,
            track_temp: 45.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("strategy source unreachable: {0}")]
    Transport(String),

    #[error("strategy source answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("strategy source sent an unreadable body: {0}")]
    Decode(String),
}

/// Producer of ranked strategies. Its ordering and optimality are taken as-is.
#[async_trait]
pub trait StrategySource: Send + Sync {
    async fn fetch(&self, request: &StrategyRequest) -> Result<Vec<Strategy>, SourceError>;
}
