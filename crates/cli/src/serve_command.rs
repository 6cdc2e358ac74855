use std::time::Duration;

use {
    anyhow::{Context, Result},
    chatops_gateway::{AppState, start_gateway},
    chatops_slack::{SlackAccountConfig, start_socket_mode},
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info},
};

use crate::{Cli, local_commands::build_dispatcher};

/// Run the gateway plus one Socket Mode session per configured Slack
/// account until Ctrl-C.
pub async fn serve(cli: &Cli) -> Result<()> {
    let config = chatops_config::load_or_discover(cli.config.as_deref())?;

    // CLI args override config values
    let bind = cli.bind.clone().unwrap_or(config.server.bind);
    let port = cli.port.unwrap_or(config.server.port);
    let response_timeout = Duration::from_millis(config.server.response_timeout_ms);

    #[cfg(feature = "metrics")]
    let metrics_handle = chatops_metrics::init_metrics(chatops_metrics::MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        global_labels: config.metrics.labels.into_iter().collect(),
    })?;

    let dispatcher = build_dispatcher()?;
    info!(
        actions = dispatcher.registry().len(),
        "action registry ready"
    );

    let cancel = CancellationToken::new();
    let http = reqwest::Client::new();

    let mut sessions = Vec::new();
    for (account_id, value) in config.channels.slack {
        let account = SlackAccountConfig::from_value(value)
            .with_context(|| format!("invalid Slack account `{account_id}`"))?;
        if !account.socket_mode {
            debug!(account_id = %account_id, "slack account serves slash commands only");
            continue;
        }
        match start_socket_mode(
            account_id.clone(),
            account,
            dispatcher.clone(),
            http.clone(),
            response_timeout,
            cancel.child_token(),
        )
        .await
        {
            Ok(handle) => sessions.push(handle),
            Err(e) => error!(account_id = %account_id, error = %e, "failed to start slack socket mode"),
        }
    }

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
        }
        shutdown.cancel();
    });

    let mut state = AppState::new(dispatcher, response_timeout);
    state.http = http;
    #[cfg(feature = "metrics")]
    let state = state.with_metrics(metrics_handle);

    let result = start_gateway(&bind, port, state, cancel.clone()).await;
    cancel.cancel();
    for session in sessions {
        let _ = session.await;
    }
    result
}
