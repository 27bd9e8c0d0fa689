use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json,
};
use parking_lot::Mutex;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use strategy_playback::{
    rank, ChartSlot, PlaybackError, SourceError, StrategyCard, StrategyChart, StrategySource,
    DEFAULT_TOP_N,
};
use tracing_subscriber::EnvFilter;

mod model;
mod types;

use types::StrategyQuery;

type ApiError = (StatusCode, Json<serde_json::Value>);

// ---------- Server state ----------

#[derive(Clone)]
struct AppState {
    source: Arc<dyn StrategySource>,
    // the one chart this gateway draws; a new computation replaces it
    chart: Arc<Mutex<ChartSlot>>,
    top_n: usize,
}

fn error(status: StatusCode, msg: impl std::fmt::Display) -> ApiError {
    (status, Json(json!({ "error": msg.to_string() })))
}

fn source_failure(e: SourceError) -> ApiError {
    tracing::warn!("strategy source failed: {}", e);
    error(StatusCode::BAD_GATEWAY, e)
}

// ---------- Handlers ----------

async fn compute_cards(state: &AppState, query: StrategyQuery) -> Result<Vec<StrategyCard>, ApiError> {
    let request = query
        .into_request()
        .map_err(|e| error(StatusCode::BAD_REQUEST, e))?;
    let strategies = state.source.fetch(&request).await.map_err(source_failure)?;
    tracing::info!(
        "circuit={} laps={} air={:.1} track={:.1} -> {} strategies",
        request.circuit,
        request.total_laps,
        request.air_temp,
        request.track_temp,
        strategies.len()
    );

    for (i, s) in strategies.iter().enumerate() {
        if !s.pit_stops_consistent() || s.stint_laps() != request.total_laps {
            tracing::warn!(
                "strategy #{} inconsistent: {} stints, {} pit stops, {} laps for a {}-lap race",
                i,
                s.stints.len(),
                s.pit_stops,
                s.stint_laps(),
                request.total_laps
            );
        }
    }

    let chart = StrategyChart::build(&strategies, request.total_laps);
    let previous = state.chart.lock().replace(chart);
    drop(previous);

    Ok(rank(&strategies, state.top_n)
        .into_iter()
        .map(|ranked| StrategyCard::build(ranked, request.total_laps))
        .collect())
}

async fn strategy(
    State(state): State<AppState>,
    Query(query): Query<StrategyQuery>,
) -> Result<Json<Vec<StrategyCard>>, ApiError> {
    compute_cards(&state, query).await.map(Json)
}

async fn recommended(
    State(state): State<AppState>,
    Query(query): Query<StrategyQuery>,
) -> Result<Json<StrategyCard>, ApiError> {
    compute_cards(&state, query)
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, PlaybackError::NoStrategiesAvailable))
}

async fn chart(State(state): State<AppState>) -> Result<Json<StrategyChart>, ApiError> {
    state
        .chart
        .lock()
        .current()
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "no chart drawn yet"))
}

fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/strategy", get(strategy))
        .route("/strategy/recommended", get(recommended))
        .route("/chart", get(chart))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let source_url = std::env::var("STRATEGY_SOURCE_URL")
        .map_err(|_| anyhow::anyhow!("STRATEGY_SOURCE_URL not set"))?;
    let port: u16 = std::env::var("PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8080);
    let top_n: usize = std::env::var("TOP_N")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TOP_N);

    let source = model::HttpStrategySource::new(&source_url, Duration::from_secs(10))?;
    tracing::info!("strategy source at {}", source.endpoint());

    let state = AppState {
        source: Arc::new(source),
        chart: Arc::new(Mutex::new(ChartSlot::new())),
        top_n,
    };

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
