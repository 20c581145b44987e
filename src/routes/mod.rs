// HTTP routes: pull endpoint for the buffered snapshot, plus version and self-metrics

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::buffer::SnapshotBuffer;
use crate::stats::ExporterStats;

pub const METRICS_PATH: &str = "/api/metrics";
pub const SELF_METRICS_PATH: &str = "/metrics";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) buffer: Arc<SnapshotBuffer>,
    pub(crate) stats: Arc<ExporterStats>,
}

pub fn app(buffer: Arc<SnapshotBuffer>, stats: Arc<ExporterStats>) -> Router {
    let state = AppState { buffer, stats };
    Router::new()
        .route("/", get(|| async { "site-exporter: metrics at /api/metrics" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route(METRICS_PATH, get(http::metrics_handler)) // GET /api/metrics
        .route(SELF_METRICS_PATH, get(http::self_metrics_handler)) // GET /metrics
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
