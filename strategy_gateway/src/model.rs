use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use strategy_playback::{SourceError, Strategy, StrategyRequest, StrategySource};

/// Strategy source reached over HTTP (`GET {base}/api/strategy`).
pub struct HttpStrategySource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStrategySource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/strategy", self.base_url)
    }
}

#[async_trait]
impl StrategySource for HttpStrategySource {
    async fn fetch(&self, request: &StrategyRequest) -> Result<Vec<Strategy>, SourceError> {
        let resp = self
            .client
            .get(self.endpoint())
            .query(&[
                ("circuit", request.circuit.clone()),
                ("laps", request.total_laps.to_string()),
                ("airTemp", request.air_temp.to_string()),
                ("trackTemp", request.track_temp.to_string()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Vec<Strategy>>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}
