// Plain HTTP handlers: version, window view, reset

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use super::AppState;
use crate::models::WindowView;
use crate::range::display_ranges;
use crate::version::{NAME, VERSION, banner};

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
        "banner": banner(),
    }))
}

/// GET /api/window: current window plus display ranges, computed on demand.
pub(super) async fn window_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.pipeline.snapshot();
    let ranges = display_ranges(&snapshot, state.config.window.history);
    axum::Json(WindowView { snapshot, ranges })
}

/// POST /api/reset: clear the window; subscribers get a BufferReset event.
pub(super) async fn reset_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.pipeline.reset();
    StatusCode::NO_CONTENT
}
