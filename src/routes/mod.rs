// HTTP + WebSocket routes: the consumer-facing surface of the window

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pipeline: Pipeline,
    pub(crate) ws_event_connections: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    pipeline: Pipeline,
    ws_event_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        pipeline,
        ws_event_connections,
        config,
    };
    Router::new()
        .route("/", get(|| async { "telemon: telemetry window is up" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/window", get(http::window_handler)) // GET /api/window
        .route("/api/reset", post(http::reset_handler)) // POST /api/reset
        .route("/ws/events", get(ws::ws_events)) // WS /ws/events
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
