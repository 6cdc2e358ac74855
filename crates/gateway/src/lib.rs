//! Gateway: HTTP front door for chatops.
//!
//! Lifecycle:
//! 1. Build the action registry and dispatcher (done by the caller)
//! 2. Bind the HTTP listener
//! 3. Serve the Slack slash-command webhook, health and metrics routes
//! 4. Shut down gracefully when the cancellation token fires
//!
//! Socket Mode sessions run beside the gateway and share its dispatcher, but
//! are started by the binary, not here.

#[cfg(feature = "metrics")]
pub mod metrics_routes;
pub mod server;
pub mod slack_routes;

pub use server::{AppState, build_gateway_app, start_gateway};
