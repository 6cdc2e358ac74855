use {anyhow::Result, async_trait::async_trait, chatops_actions::ChannelOutbound};

use crate::{api::SlackApi, config::MessageParams};

/// Posts action replies to Slack users as direct messages.
#[derive(Clone)]
pub struct SlackOutbound {
    api: SlackApi,
    params: MessageParams,
}

impl SlackOutbound {
    pub fn new(api: SlackApi, params: MessageParams) -> Self {
        Self { api, params }
    }
}

#[async_trait]
impl ChannelOutbound for SlackOutbound {
    async fn send_text(&self, to: &str, text: &str) -> Result<()> {
        self.api.post_message(to, text, &self.params).await
    }
}

#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher, secrecy::Secret, serde_json::json};

    #[tokio::test]
    async fn send_text_posts_to_user_with_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_body(Matcher::Json(json!({
                "channel": "U42",
                "text": "Adding 1 and 2",
                "username": "calc",
            })))
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let api = SlackApi::new(
            reqwest::Client::new(),
            server.url(),
            Secret::new("xoxb-test".to_string()),
        );
        let outbound = SlackOutbound::new(api, MessageParams {
            username: Some("calc".into()),
            ..Default::default()
        });

        outbound.send_text("U42", "Adding 1 and 2").await.unwrap();
        mock.assert_async().await;
    }
}
