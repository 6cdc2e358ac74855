//! Chat command dispatch.
//!
//! Free-text messages are tokenized into an action name plus positional
//! arguments, resolved against an [`ActionRegistry`], and run with a [`Reply`]
//! handle that reaches the user over whichever channel the message came from.
//!
//! ```rust,ignore
//! let registry = Arc::new(ActionRegistry::new());
//! registry.register(ActionDef::new("ping").handler(ping))?;
//! let dispatcher = Dispatcher::new(registry);
//! dispatcher.dispatch("ping", "alice", reply).await;
//! ```

pub mod action;
pub mod dispatch;
pub mod error;
pub mod parse;
pub mod registry;
pub mod reply;

pub use {
    action::{Action, ActionDef, ActionHandler, ActionResult, Invocation, Parameter},
    dispatch::{Dispatcher, HELP_ACTION, Outcome},
    error::{Error, Result},
    parse::{ParsedMessage, parse},
    registry::ActionRegistry,
    reply::{ChannelOutbound, FollowUp, PushReply, Reply, ReplyChannel, ResponseReply},
};
