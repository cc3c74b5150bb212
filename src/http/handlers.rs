//! Route handlers. All of them are read-only views of the register.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::render::{format_exposition, render_exceeding_page, DISPLAY_MODE_MISMATCH};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub cycles: usize,
}

/// `GET /metrics`: latest readings in text exposition format.
pub async fn get_metrics(State(state): State<AppState>) -> String {
    let readings = state.register.latest();
    format_exposition(&state.metric_name, &readings)
}

/// `GET /exceeding`: ranking page, or 404 when the display mode excludes it.
pub async fn get_exceeding(State(state): State<AppState>) -> Response {
    if !state.display_mode.shows_page() {
        tracing::debug!(mode = ?state.display_mode, "Exceeding page requested outside page mode");
        return (StatusCode::NOT_FOUND, DISPLAY_MODE_MISMATCH).into_response();
    }

    let top = state.register.top_exceedances(state.top_k);
    Html(render_exceeding_page(state.top_k, &top)).into_response()
}

/// `GET /health`: liveness and cycle count.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cycles: state.register.history_len(),
    })
}
