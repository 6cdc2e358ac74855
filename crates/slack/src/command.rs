//! Slash-command webhook support: the request/response side of the bot.

use std::{sync::Arc, time::Duration};

use {
    anyhow::{Result, bail},
    async_trait::async_trait,
    chatops_actions::{Dispatcher, FollowUp, Reply, ResponseReply},
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use chatops_metrics::{counter, http as http_metrics};

/// Form payload Slack posts when a user runs a slash command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SlashCommand {
    pub command: String,
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    pub channel_id: String,
    pub team_id: String,
    pub response_url: Option<String>,
}

#[derive(Serialize)]
struct EphemeralMessage<'a> {
    response_type: &'static str,
    text: &'a str,
}

/// Delivers follow-up messages by posting to the command's `response_url`.
pub struct ResponseUrlFollowUp {
    http: reqwest::Client,
    url: String,
}

impl ResponseUrlFollowUp {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FollowUp for ResponseUrlFollowUp {
    async fn deliver(&self, text: &str) -> Result<()> {
        let resp = self
            .http
            .post(&self.url)
            .json(&EphemeralMessage {
                response_type: "ephemeral",
                text,
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            bail!("response_url returned HTTP {status}");
        }
        Ok(())
    }
}

/// Run a slash command and wait up to `timeout` for its first reply.
///
/// Returns the text to answer the webhook request with, or `None` when the
/// action sent nothing in time. The dispatch keeps running after the deadline;
/// everything it sends from then on goes to `response_url`.
pub async fn dispatch_slash_command(
    dispatcher: &Dispatcher,
    command: &SlashCommand,
    http: &reqwest::Client,
    timeout: Duration,
) -> Option<String> {
    let follow_up = command
        .response_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(|url| Arc::new(ResponseUrlFollowUp::new(http.clone(), url)) as Arc<dyn FollowUp>);
    let (channel, mut rx) = ResponseReply::new(follow_up);
    let reply = Reply::new(channel);

    let dispatcher = dispatcher.clone();
    let text = command.text.clone();
    let user = command.user_name.clone();
    tokio::spawn(async move {
        dispatcher.dispatch(&text, &user, reply).await;
    });

    match tokio::time::timeout(timeout, &mut rx).await {
        Ok(Ok(text)) => Some(text),
        Ok(Err(_)) => {
            debug!(command = %command.command, "slash command finished without a reply");
            None
        },
        Err(_) => {
            // Close first so a reply racing the deadline is either received
            // here or rerouted to the follow-up, never lost.
            rx.close();
            if let Ok(text) = rx.try_recv() {
                return Some(text);
            }
            warn!(
                command = %command.command,
                user = %command.user_name,
                timeout = ?timeout,
                "slash command reply missed the deadline, continuing via response_url"
            );

            #[cfg(feature = "metrics")]
            counter!(http_metrics::RESPONSE_TIMEOUTS_TOTAL).increment(1);

            None
        },
    }
}
