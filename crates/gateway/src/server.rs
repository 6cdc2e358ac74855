use std::time::Duration;

use {
    axum::{
        Router,
        response::{IntoResponse, Json},
        routing::{get, post},
    },
    chatops_actions::Dispatcher,
    tokio::net::TcpListener,
    tokio_util::sync::CancellationToken,
    tower_http::trace::TraceLayer,
    tracing::info,
};

#[cfg(feature = "metrics")]
use chatops_metrics::MetricsHandle;

use crate::slack_routes::slash_command_handler;

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Client used for `response_url` follow-ups.
    pub http: reqwest::Client,
    /// How long a webhook request waits for the action's first reply.
    pub response_timeout: Duration,
    #[cfg(feature = "metrics")]
    pub metrics_handle: Option<MetricsHandle>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, response_timeout: Duration) -> Self {
        Self {
            dispatcher,
            http: reqwest::Client::new(),
            response_timeout,
            #[cfg(feature = "metrics")]
            metrics_handle: None,
        }
    }

    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, handle: MetricsHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/slack/commands", post(slash_command_handler));

    #[cfg(feature = "metrics")]
    let router = router.route(
        "/metrics",
        get(crate::metrics_routes::prometheus_metrics_handler),
    );

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Start the gateway HTTP server and run it until `cancel` fires.
pub async fn start_gateway(
    bind: &str,
    port: u16,
    state: AppState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((bind, port)).await?;
    info!(addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, build_gateway_app(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("gateway stopped");
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}
