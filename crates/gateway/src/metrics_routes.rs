//! Metrics route for Prometheus scraping.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::server::AppState;

/// Prometheus metrics endpoint handler.
///
/// Returns metrics in Prometheus text exposition format. The body is empty
/// when metrics collection is disabled.
pub async fn prometheus_metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}
