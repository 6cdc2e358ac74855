//! Slack slash-command webhook.

use {
    axum::{
        extract::{Form, State, rejection::FormRejection},
        http::{StatusCode, header},
        response::IntoResponse,
    },
    chatops_slack::{SlashCommand, dispatch_slash_command},
    tracing::{info, warn},
};

#[cfg(feature = "metrics")]
use chatops_metrics::{counter, http as http_metrics, labels};

use crate::server::AppState;

/// Shown when the webhook body is not a slash-command form.
const UNREADABLE_PAYLOAD: &str = "Could not read the command payload.";

/// `POST /slack/commands`.
///
/// Always answers 200: Slack shows any other status to the user as a generic
/// failure, hiding the text. The body is the action's first reply, or empty
/// when it sent nothing before the deadline.
pub async fn slash_command_handler(
    State(state): State<AppState>,
    form: Result<Form<SlashCommand>, FormRejection>,
) -> impl IntoResponse {
    #[cfg(feature = "metrics")]
    counter!(http_metrics::REQUESTS_TOTAL, labels::CHANNEL => "slack").increment(1);

    let body = match form {
        Ok(Form(command)) => {
            info!(
                command = %command.command,
                user = %command.user_name,
                "slash command received"
            );
            dispatch_slash_command(
                &state.dispatcher,
                &command,
                &state.http,
                state.response_timeout,
            )
            .await
            .unwrap_or_default()
        },
        Err(e) => {
            warn!(error = %e, "rejected slash command payload");
            UNREADABLE_PAYLOAD.to_string()
        },
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
}
