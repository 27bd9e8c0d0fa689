mod config;
mod model;
mod session;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use strategy_playback::{PlaybackConfig, PlaybackScheduler};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing_subscriber::EnvFilter;

use model::Outgoing;
use session::ViewerSessions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg_path = config::resolve_config_path();
    let cfg = Arc::new(config::load_or_default(&cfg_path));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8765".to_string());
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind TCP listener at {}", bind_addr))?;
    tracing::info!("playback backend listening on ws://{}", bind_addr);

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::info!("viewer connected from {}", peer);
                tokio::spawn(handle_connection(stream, cfg.clone()));
            }
            Err(e) => {
                tracing::warn!("accept error: {}", e);
                // small delay to avoid tight loop in case of persistent errors
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, cfg: Arc<PlaybackConfig>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!("websocket handshake failed: {}", e);
            return;
        }
    };
    let (mut write, mut read) = ws_stream.split();

    // every session of this connection funnels into one writer
    let (tx, mut rx) = mpsc::unbounded_channel::<Outgoing>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("failed to encode frame: {}", e);
                    continue;
                }
            };
            if write.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut sessions = ViewerSessions::new(PlaybackScheduler::new((*cfg).clone()), tx);

    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!("read error: {}", e);
                break;
            }
        };
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else {
            continue;
        };

        sessions.handle_text(text);
    }

    // viewer gone: the running session sees it on its next tick
    drop(sessions);
    // sessions still hold senders until they observe the cancel
    if let Err(e) = writer.await {
        tracing::debug!("writer task ended abnormally: {}", e);
    }
    tracing::info!("viewer disconnected");
}
