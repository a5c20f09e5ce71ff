// WebSocket stream of telemetry events

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::TelemetryEvent;

/// Ping interval for WebSocket connection health.
const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
/// Max time to wait for a send before treating the client as dead.
const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements the event-stream connection count on drop.
struct WsEventsGuard(Arc<AtomicUsize>);

impl Drop for WsEventsGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

async fn send_or_close(socket: &mut WebSocket, message: Message) -> bool {
    matches!(timeout(WS_SEND_TIMEOUT, socket.send(message)).await, Ok(Ok(())))
}

pub(super) async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let pipeline = state.pipeline.clone();
    let conn_count = state.ws_event_connections.clone();
    ws.on_upgrade(move |socket| async move {
        // Subscribe on upgrade so events from before the client arrived are not replayed.
        let mut rx = pipeline.subscribe();
        let interval_secs = pipeline.aggregator().interval();
        if let Err(e) = stream_events(socket, &mut rx, conn_count, interval_secs).await {
            tracing::info!("Event stream error: {}", e);
        }
    })
}

async fn stream_events(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<TelemetryEvent>,
    conn_count: Arc<AtomicUsize>,
    interval_secs: f64,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, Ordering::Relaxed);
    let _guard = WsEventsGuard(conn_count);
    tracing::info!("Client connected to event stream");

    // Greet with the interval in effect so the client can scale its time axis.
    let welcome = serde_json::to_string(&TelemetryEvent::IntervalChanged {
        seconds: interval_secs,
    })?;
    if !send_or_close(&mut socket, Message::Text(welcome.into())).await {
        return Ok(());
    }

    let first_ping = tokio::time::Instant::now() + WS_PING_INTERVAL;
    let mut ping_interval = tokio::time::interval_at(first_ping, WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        let json = serde_json::to_string(&event)?;
                        if !send_or_close(&mut socket, Message::Text(json.into())).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/events client lagged, skipped {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                // Client frames are ignored; only a close or a dead socket ends the stream.
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                if !send_or_close(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
        }
    }
    tracing::info!("Client left event stream");
    Ok(())
}
