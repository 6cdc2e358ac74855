//! Reply channels: how an action's messages reach the user who invoked it.
//!
//! There are two delivery shapes. A push channel delivers every message the
//! same way over a long-lived session. A request/response channel answers the
//! inbound request with the first message and sends everything after that
//! through a follow-up path supplied by the request.

use std::sync::{Arc, Mutex};

use {
    anyhow::Result,
    async_trait::async_trait,
    tokio::sync::oneshot,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use chatops_metrics::{counter, labels, reply as reply_metrics};

/// Sends a message to the user bound to one in-flight dispatch.
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;

    /// Short name of the delivery shape, for logs and metrics.
    fn variant(&self) -> &'static str {
        "custom"
    }
}

/// Cloneable handle handed to action handlers.
#[derive(Clone)]
pub struct Reply {
    channel: Arc<dyn ReplyChannel>,
}

impl Reply {
    pub fn new(channel: impl ReplyChannel + 'static) -> Self {
        Self {
            channel: Arc::new(channel),
        }
    }

    pub fn from_arc(channel: Arc<dyn ReplyChannel>) -> Self {
        Self { channel }
    }

    /// Deliver `message`. Failures are returned to the caller and logged.
    pub async fn send(&self, message: impl AsRef<str>) -> Result<()> {
        let variant = self.channel.variant();

        #[cfg(feature = "metrics")]
        counter!(reply_metrics::SENDS_TOTAL, labels::VARIANT => variant).increment(1);

        let result = self.channel.send(message.as_ref()).await;
        if let Err(e) = &result {
            warn!(variant, error = %e, "sending reply failed");

            #[cfg(feature = "metrics")]
            counter!(reply_metrics::SEND_FAILURES_TOTAL, labels::VARIANT => variant).increment(1);
        }
        result
    }

    pub fn variant(&self) -> &'static str {
        self.channel.variant()
    }
}

// ── Push ────────────────────────────────────────────────────────────────────

/// Delivers text to a user over a chat platform, outside of any request.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> Result<()>;
}

/// Every message goes straight to the user through the outbound transport.
pub struct PushReply {
    outbound: Arc<dyn ChannelOutbound>,
    to: String,
}

impl PushReply {
    pub fn new(outbound: Arc<dyn ChannelOutbound>, to: impl Into<String>) -> Self {
        Self {
            outbound,
            to: to.into(),
        }
    }
}

#[async_trait]
impl ReplyChannel for PushReply {
    async fn send(&self, message: &str) -> Result<()> {
        self.outbound.send_text(&self.to, message).await
    }

    fn variant(&self) -> &'static str {
        "push"
    }
}

// ── Request/response ────────────────────────────────────────────────────────

/// Out-of-band delivery for messages after the direct response, e.g. a
/// callback URL supplied with the inbound request.
#[async_trait]
pub trait FollowUp: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<()>;
}

/// The first message answers the inbound request; later ones use the follow-up.
pub struct ResponseReply {
    direct: Mutex<Option<oneshot::Sender<String>>>,
    follow_up: Option<Arc<dyn FollowUp>>,
}

impl ResponseReply {
    /// Create the channel together with the receiver the request handler
    /// awaits for its direct response. The receiver resolves with an error if
    /// the dispatch finishes without sending anything.
    pub fn new(follow_up: Option<Arc<dyn FollowUp>>) -> (Self, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        let reply = Self {
            direct: Mutex::new(Some(tx)),
            follow_up,
        };
        (reply, rx)
    }

    async fn send_follow_up(&self, message: &str) -> Result<()> {
        match &self.follow_up {
            Some(follow_up) => follow_up.deliver(message).await,
            None => anyhow::bail!("no follow-up delivery available for this request"),
        }
    }
}

#[async_trait]
impl ReplyChannel for ResponseReply {
    async fn send(&self, message: &str) -> Result<()> {
        let direct = self
            .direct
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some(tx) = direct {
            match tx.send(message.to_string()) {
                Ok(()) => return Ok(()),
                Err(message) => {
                    // The request stopped waiting (deadline or disconnect).
                    debug!("direct response no longer awaited, using follow-up");
                    return self.send_follow_up(&message).await;
                },
            }
        }

        self.send_follow_up(message).await
    }

    fn variant(&self) -> &'static str {
        "response"
    }
}
