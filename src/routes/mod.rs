// HTTP routes: banner, version, health, and the Prometheus scrape endpoint

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::metrics_store::MetricsStore;
use crate::poller::PollStats;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<MetricsStore>,
    pub(crate) stats: Arc<PollStats>,
}

pub fn app(store: Arc<MetricsStore>, stats: Arc<PollStats>) -> Router {
    let state = AppState { store, stats };
    Router::new()
        .route("/", get(|| async { "Nexus exporter: metrics at /metrics" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/health", get(http::health_handler)) // GET /health
        .route("/metrics", get(http::metrics_handler)) // GET /metrics
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
