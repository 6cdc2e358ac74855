//! Config schema types (server, metrics, channels).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatopsConfig {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub channels: ChannelsConfig,
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on. Defaults to 3000.
    pub port: u16,
    /// How long a webhook request waits for the action's first reply before
    /// answering with an empty body. Slack gives up after three seconds.
    pub response_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
            response_timeout_ms: 2500,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled. Defaults to false.
    pub enabled: bool,
    /// Labels attached to every exported metric.
    pub labels: HashMap<String, String>,
}

/// Channel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Slack bot accounts, keyed by account ID. Parsed by the Slack crate.
    pub slack: HashMap<String, serde_json::Value>,
}
