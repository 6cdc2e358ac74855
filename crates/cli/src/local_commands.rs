//! Offline commands: inspect the tokenizer or run an action without Slack.

use std::sync::Arc;

use {
    anyhow::Result,
    async_trait::async_trait,
    chatops_actions::{ActionRegistry, ChannelOutbound, Dispatcher, PushReply, Reply, parse},
};

use crate::actions::demo_actions;

/// Prints every reply on its own line.
struct StdoutOutbound;

#[async_trait]
impl ChannelOutbound for StdoutOutbound {
    async fn send_text(&self, _to: &str, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }
}

pub fn build_dispatcher() -> Result<Dispatcher> {
    let registry = Arc::new(ActionRegistry::new());
    registry.register_many(demo_actions())?;
    Ok(Dispatcher::new(registry))
}

pub fn print_parse(text: &str) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&parse(text))?);
    Ok(())
}

pub async fn run_local(user: &str, text: &str) -> Result<()> {
    let dispatcher = build_dispatcher()?;
    let reply = Reply::new(PushReply::new(Arc::new(StdoutOutbound), user));
    let outcome = dispatcher.dispatch(text, user, reply).await;
    if let Some(error) = outcome.error() {
        // Already printed as the final reply; the exit status tells scripts.
        anyhow::bail!("dispatch failed: {}", error.kind());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatcher_has_demo_actions() {
        let dispatcher = build_dispatcher().unwrap();
        assert_eq!(dispatcher.registry().names(), vec!["add", "sub", "echo"]);
    }

    #[tokio::test]
    async fn run_local_reports_failed_dispatch() {
        assert!(run_local("alice", "add 1 2").await.is_ok());
        let err = run_local("alice", "mul 1 2").await.unwrap_err();
        assert!(err.to_string().contains("unknown_action"));
    }
}
