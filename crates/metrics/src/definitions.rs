//! Metric name and label definitions.
//!
//! Every metric name used across the workspace lives here so the exported set
//! is documented in one place.

/// Dispatcher metrics
pub mod dispatch {
    /// Total number of dispatched messages, labelled by outcome
    pub const TOTAL: &str = "chatops_dispatch_total";
    /// Time from parse to final reply in seconds
    pub const DURATION_SECONDS: &str = "chatops_dispatch_duration_seconds";
    /// Dispatches that ended in a user-facing error, labelled by error type
    pub const ERRORS_TOTAL: &str = "chatops_dispatch_errors_total";
}

/// Action registry metrics
pub mod registry {
    /// Number of registered actions
    pub const ACTIONS: &str = "chatops_registered_actions";
}

/// Reply channel metrics
pub mod reply {
    /// Messages handed to a reply channel
    pub const SENDS_TOTAL: &str = "chatops_reply_sends_total";
    /// Messages that could not be delivered
    pub const SEND_FAILURES_TOTAL: &str = "chatops_reply_send_failures_total";
}

/// HTTP webhook metrics
pub mod http {
    /// Total number of webhook requests handled
    pub const REQUESTS_TOTAL: &str = "chatops_http_requests_total";
    /// Webhook requests answered without a direct reply before the deadline
    pub const RESPONSE_TIMEOUTS_TOTAL: &str = "chatops_http_response_timeouts_total";
}

/// Slack Socket Mode metrics
pub mod socket {
    /// Envelopes received over the socket
    pub const ENVELOPES_TOTAL: &str = "chatops_socket_envelopes_total";
    /// Socket reconnect attempts
    pub const RECONNECTS_TOTAL: &str = "chatops_socket_reconnects_total";
}

/// Common label keys
pub mod labels {
    pub const OUTCOME: &str = "outcome";
    pub const ERROR_TYPE: &str = "error_type";
    pub const VARIANT: &str = "variant";
    pub const CHANNEL: &str = "channel";
    pub const ACCOUNT_ID: &str = "account_id";
    pub const ENVELOPE_TYPE: &str = "envelope_type";
}

/// Standard histogram buckets
pub mod buckets {
    /// Dispatch duration buckets (in seconds), 1ms to 60s
    pub const DISPATCH_DURATION: &[f64] = &[
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
    ];
}
