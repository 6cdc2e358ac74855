//! Socket Mode connection handler for Slack.
//!
//! Receives events over a WebSocket without requiring a public HTTP endpoint.
//! Direct messages are dispatched with a push reply addressed to the sender;
//! slash commands are answered through the envelope acknowledgement.

use std::{sync::Arc, time::Duration};

use {
    anyhow::{Context, Result},
    chatops_actions::{ChannelOutbound, Dispatcher, PushReply, Reply},
    futures::{SinkExt, StreamExt},
    secrecy::Secret,
    serde::Deserialize,
    serde_json::{Value, json},
    tokio::{sync::mpsc, task::JoinHandle},
    tokio_tungstenite::{connect_async, tungstenite::Message},
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use chatops_metrics::{counter, labels, socket as socket_metrics};

use crate::{
    api::SlackApi,
    command::{SlashCommand, dispatch_slash_command},
    config::SlackAccountConfig,
    outbound::SlackOutbound,
};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// One frame received over the socket, decoded.
#[derive(Debug, PartialEq)]
enum Inbound {
    Hello,
    Disconnect {
        reason: Option<String>,
    },
    Event {
        envelope_id: String,
        event: Value,
    },
    SlashCommand {
        envelope_id: String,
        command: SlashCommand,
    },
    Other {
        envelope_id: Option<String>,
        kind: String,
    },
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    envelope_id: Option<String>,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    reason: Option<String>,
}

fn parse_envelope(text: &str) -> Result<Inbound> {
    let raw: RawEnvelope = serde_json::from_str(text)?;
    let inbound = match (raw.kind.as_str(), raw.envelope_id) {
        ("hello", _) => Inbound::Hello,
        ("disconnect", _) => Inbound::Disconnect { reason: raw.reason },
        ("events_api", Some(envelope_id)) => Inbound::Event {
            envelope_id,
            event: raw.payload.get("event").cloned().unwrap_or(Value::Null),
        },
        ("slash_commands", Some(envelope_id)) => Inbound::SlashCommand {
            envelope_id,
            command: serde_json::from_value(raw.payload)?,
        },
        (_, envelope_id) => Inbound::Other {
            envelope_id,
            kind: raw.kind,
        },
    };
    Ok(inbound)
}

/// Acknowledgement frame, optionally carrying a response for slash commands.
fn ack_frame(envelope_id: &str, text: Option<&str>) -> String {
    match text {
        Some(text) => json!({ "envelope_id": envelope_id, "payload": { "text": text } }),
        None => json!({ "envelope_id": envelope_id }),
    }
    .to_string()
}

/// A user message worth dispatching.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UserMessage {
    user: String,
    text: String,
}

/// Pull the dispatchable message out of an `events_api` event.
///
/// Edited messages are unwrapped to their new content. Messages from the bot
/// itself, from other bots, or without a user are skipped.
fn extract_message(event: &Value, bot_user_id: &str) -> Option<UserMessage> {
    if event.get("type").and_then(Value::as_str) != Some("message") {
        return None;
    }
    if event.get("user").and_then(Value::as_str) == Some(bot_user_id) {
        return None;
    }

    let message = match event.get("subtype").and_then(Value::as_str) {
        Some("message_changed") => event.get("message")?,
        _ => event,
    };

    if message.get("bot_id").is_some() {
        return None;
    }
    let user = message.get("user").and_then(Value::as_str)?;
    if user == bot_user_id {
        return None;
    }

    Some(UserMessage {
        user: user.to_string(),
        text: message
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Why a single connection ended.
enum Exit {
    Cancelled,
    /// `greeted` is set once Slack sent `hello` on this connection.
    Reconnect { greeted: bool },
}

/// What the connection loop should do after one frame.
#[derive(Debug, PartialEq)]
enum Frame {
    Continue,
    Greeted,
    Reconnect,
}

/// Exponential reconnect delay, capped at [`MAX_BACKOFF`].
#[derive(Debug)]
struct Backoff {
    current: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            current: INITIAL_BACKOFF,
        }
    }

    fn reset(&mut self) {
        self.current = INITIAL_BACKOFF;
    }

    /// The delay to wait now; doubles the next one.
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (delay * 2).min(MAX_BACKOFF);
        delay
    }
}

struct SocketSession {
    account_id: String,
    api: SlackApi,
    app_token: Secret<String>,
    bot_user_id: String,
    outbound: Arc<dyn ChannelOutbound>,
    dispatcher: Dispatcher,
    http: reqwest::Client,
    response_timeout: Duration,
}

/// Start a Socket Mode session for a Slack account.
///
/// Authenticates the bot token up front so misconfiguration fails fast, then
/// runs the connection loop in the background until `cancel` fires.
pub async fn start_socket_mode(
    account_id: String,
    config: SlackAccountConfig,
    dispatcher: Dispatcher,
    http: reqwest::Client,
    response_timeout: Duration,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    let app_token = config
        .app_token
        .clone()
        .context("Slack app_token is required for socket_mode")?;
    let api = SlackApi::from_config(http.clone(), &config);

    let identity = api.auth_test().await?;
    info!(
        account_id = %account_id,
        bot_user = ?identity.user,
        "slack bot authenticated"
    );

    let outbound = Arc::new(SlackOutbound::new(api.clone(), config.message_params()));
    let session = Arc::new(SocketSession {
        account_id,
        api,
        app_token,
        bot_user_id: identity.user_id,
        outbound,
        dispatcher,
        http,
        response_timeout,
    });

    Ok(tokio::spawn(session.run(cancel)))
}

impl SocketSession {
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut backoff = Backoff::new();

        loop {
            // A connection that never saw `hello` counts as a failure, so a
            // server closing right away cannot make us spin.
            let delay = match Arc::clone(&self).connect_and_run(&cancel).await {
                Ok(Exit::Cancelled) => break,
                Ok(Exit::Reconnect { greeted: true }) => {
                    backoff.reset();
                    info!(account_id = %self.account_id, "slack socket closed, reconnecting");
                    None
                },
                Ok(Exit::Reconnect { greeted: false }) => {
                    let delay = backoff.next_delay();
                    warn!(
                        account_id = %self.account_id,
                        delay = ?delay,
                        "slack socket closed before hello"
                    );
                    Some(delay)
                },
                Err(e) => {
                    let delay = backoff.next_delay();
                    error!(
                        account_id = %self.account_id,
                        error = %e,
                        delay = ?delay,
                        "slack socket connection failed"
                    );
                    Some(delay)
                },
            };

            if let Some(delay) = delay {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {},
                }
            }

            if cancel.is_cancelled() {
                break;
            }

            #[cfg(feature = "metrics")]
            counter!(socket_metrics::RECONNECTS_TOTAL, labels::ACCOUNT_ID => self.account_id.clone())
                .increment(1);
        }

        info!(account_id = %self.account_id, "slack socket mode stopped");
    }

    async fn connect_and_run(self: Arc<Self>, cancel: &CancellationToken) -> Result<Exit> {
        let url = self.api.open_socket_connection(&self.app_token).await?;
        let (ws, _response) = connect_async(url.as_str()).await?;
        let (mut sink, mut stream) = ws.split();
        debug!(account_id = %self.account_id, "slack socket connected");

        // Acks may be produced by spawned tasks (slash commands), so every
        // outgoing frame goes through one queue.
        let (ack_tx, mut ack_rx) = mpsc::unbounded_channel::<String>();
        let mut greeted = false;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(Exit::Cancelled);
                },
                Some(frame) = ack_rx.recv() => {
                    sink.send(Message::Text(frame.into())).await?;
                },
                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => match self.handle_frame(text.as_str(), &ack_tx) {
                        Frame::Continue => {},
                        Frame::Greeted => greeted = true,
                        Frame::Reconnect => return Ok(Exit::Reconnect { greeted }),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        sink.send(Message::Pong(data)).await?;
                    },
                    Some(Ok(Message::Close(_))) | None => return Ok(Exit::Reconnect { greeted }),
                    Some(Ok(_)) => {},
                    Some(Err(e)) => return Err(e.into()),
                },
            }
        }
    }

    /// Handle one text frame.
    fn handle_frame(self: &Arc<Self>, text: &str, ack_tx: &mpsc::UnboundedSender<String>) -> Frame {
        let inbound = match parse_envelope(text) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(account_id = %self.account_id, error = %e, "unparseable socket frame");
                return Frame::Continue;
            },
        };

        #[cfg(feature = "metrics")]
        counter!(
            socket_metrics::ENVELOPES_TOTAL,
            labels::ACCOUNT_ID => self.account_id.clone(),
            labels::ENVELOPE_TYPE => envelope_type(&inbound)
        )
        .increment(1);

        match inbound {
            Inbound::Hello => {
                debug!(account_id = %self.account_id, "slack socket hello");
                return Frame::Greeted;
            },
            Inbound::Disconnect { reason } => {
                info!(account_id = %self.account_id, reason = ?reason, "slack requested disconnect");
                return Frame::Reconnect;
            },
            Inbound::Event { envelope_id, event } => {
                let _ = ack_tx.send(ack_frame(&envelope_id, None));
                if let Some(message) = extract_message(&event, &self.bot_user_id) {
                    tokio::spawn(Arc::clone(self).handle_message(message));
                }
            },
            Inbound::SlashCommand {
                envelope_id,
                command,
            } => {
                let session = Arc::clone(self);
                let ack_tx = ack_tx.clone();
                tokio::spawn(async move {
                    let answer = dispatch_slash_command(
                        &session.dispatcher,
                        &command,
                        &session.http,
                        session.response_timeout,
                    )
                    .await;
                    let _ = ack_tx.send(ack_frame(&envelope_id, answer.as_deref()));
                });
            },
            Inbound::Other { envelope_id, kind } => {
                debug!(account_id = %self.account_id, kind = %kind, "ignoring socket envelope");
                if let Some(envelope_id) = envelope_id {
                    let _ = ack_tx.send(ack_frame(&envelope_id, None));
                }
            },
        }
        Frame::Continue
    }

    async fn handle_message(self: Arc<Self>, message: UserMessage) {
        let user_name = match self.api.users_info(&message.user).await {
            Ok(name) => name,
            Err(e) => {
                warn!(
                    account_id = %self.account_id,
                    user_id = %message.user,
                    error = %e,
                    "could not resolve user name, using id"
                );
                message.user.clone()
            },
        };

        let reply = Reply::new(PushReply::new(
            Arc::clone(&self.outbound),
            message.user.clone(),
        ));
        self.dispatcher
            .dispatch(&message.text, &user_name, reply)
            .await;
    }
}

#[cfg(feature = "metrics")]
fn envelope_type(inbound: &Inbound) -> &'static str {
    match inbound {
        Inbound::Hello => "hello",
        Inbound::Disconnect { .. } => "disconnect",
        Inbound::Event { .. } => "events_api",
        Inbound::SlashCommand { .. } => "slash_commands",
        Inbound::Other { .. } => "other",
    }
}
