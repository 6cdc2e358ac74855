//! Slack adapter for chatops.
//!
//! Two ways in: a Socket Mode session (persistent WebSocket, replies pushed as
//! DMs) and slash-command payloads (the first reply answers the request, later
//! ones go to the command's `response_url`).

pub mod api;
pub mod command;
pub mod config;
pub mod outbound;
pub mod socket;

pub use {
    api::{BotIdentity, SlackApi},
    command::{ResponseUrlFollowUp, SlashCommand, dispatch_slash_command},
    config::{MessageParams, SlackAccountConfig},
    outbound::SlackOutbound,
    socket::start_socket_mode,
};
