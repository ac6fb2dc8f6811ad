// GET handlers: version, health, metrics

use std::sync::atomic::Ordering;

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use super::AppState;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /health: time of the last published cycle and cycle counters.
pub(super) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let published = state.store.current().await;
    axum::Json(serde_json::json!({
        "last_success": published.at.map(|t| t.to_rfc3339()),
        "cycles_ok": state.stats.cycles_ok.load(Ordering::Relaxed),
        "cycles_failed": state.stats.cycles_failed.load(Ordering::Relaxed),
    }))
}

/// GET /metrics: Prometheus text format of the last successful cycle.
pub(super) async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.render().await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "render_metrics", "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}
