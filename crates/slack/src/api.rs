//! Minimal Slack Web API client covering the calls the bot makes.

use {
    anyhow::{Context, Result, bail},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::debug,
};

use crate::config::{MessageParams, SlackAccountConfig};

/// Identity of the bot token, as reported by `auth.test`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotIdentity {
    pub user_id: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(flatten)]
    params: &'a MessageParams,
}

#[derive(Clone)]
pub struct SlackApi {
    http: reqwest::Client,
    base_url: String,
    bot_token: Secret<String>,
}

impl SlackApi {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        bot_token: Secret<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &SlackAccountConfig) -> Self {
        Self::new(http, &config.api_base_url, config.bot_token.clone())
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    /// Check an API envelope and return it when `ok` is true.
    async fn check(method: &str, resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        if !status.is_success() {
            bail!("slack {method} returned HTTP {status}");
        }
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("slack {method} returned invalid JSON"))?;
        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            bail!("slack {method} failed: {error}");
        }
        Ok(body)
    }

    /// `auth.test`: resolve the bot's own user id.
    pub async fn auth_test(&self) -> Result<BotIdentity> {
        let resp = self
            .http
            .post(self.url("auth.test"))
            .bearer_auth(self.bot_token.expose_secret())
            .send()
            .await?;
        let body = Self::check("auth.test", resp).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// `users.info`: resolve a user id to the user's handle.
    pub async fn users_info(&self, user_id: &str) -> Result<String> {
        let resp = self
            .http
            .post(self.url("users.info"))
            .bearer_auth(self.bot_token.expose_secret())
            .form(&[("user", user_id)])
            .send()
            .await?;
        let body = Self::check("users.info", resp).await?;
        body.pointer("/user/name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .with_context(|| format!("slack users.info returned no name for {user_id}"))
    }

    /// `chat.postMessage`. A user id as `channel` lands in the bot's DM with
    /// that user.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        params: &MessageParams,
    ) -> Result<()> {
        debug!(channel, len = text.len(), "slack chat.postMessage");
        let resp = self
            .http
            .post(self.url("chat.postMessage"))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&PostMessage {
                channel,
                text,
                params,
            })
            .send()
            .await?;
        Self::check("chat.postMessage", resp).await?;
        Ok(())
    }

    /// `apps.connections.open`: fetch a fresh Socket Mode WebSocket URL.
    pub async fn open_socket_connection(&self, app_token: &Secret<String>) -> Result<String> {
        let resp = self
            .http
            .post(self.url("apps.connections.open"))
            .bearer_auth(app_token.expose_secret())
            .send()
            .await?;
        let body = Self::check("apps.connections.open", resp).await?;
        body.get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("slack apps.connections.open returned no url")
    }
}

#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher, serde_json::json};

    fn api(server: &mockito::ServerGuard) -> SlackApi {
        SlackApi::new(
            reqwest::Client::new(),
            server.url(),
            Secret::new("xoxb-test".to_string()),
        )
    }

    #[tokio::test]
    async fn auth_test_returns_bot_identity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth.test")
            .match_header("authorization", "Bearer xoxb-test")
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"user_id":"UBOT","user":"chatops","bot_id":"B1"}"#)
            .create_async()
            .await;

        let identity = api(&server).auth_test().await.unwrap();
        assert_eq!(identity, BotIdentity {
            user_id: "UBOT".into(),
            user: Some("chatops".into()),
            bot_id: Some("B1".into()),
        });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn users_info_reads_handle() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/users.info")
            .match_body(Matcher::UrlEncoded("user".into(), "U123".into()))
            .with_body(r#"{"ok":true,"user":{"id":"U123","name":"alice"}}"#)
            .create_async()
            .await;

        assert_eq!(api(&server).users_info("U123").await.unwrap(), "alice");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_message_sends_presentation_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_body(Matcher::Json(json!({
                "channel": "U123",
                "text": "hello",
                "icon_emoji": ":robot_face:",
            })))
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let params = MessageParams {
            icon_emoji: Some(":robot_face:".into()),
            ..Default::default()
        };
        api(&server)
            .post_message("U123", "hello", &params)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat.postMessage")
            .with_body(r#"{"ok":false,"error":"channel_not_found"}"#)
            .create_async()
            .await;

        let err = api(&server)
            .post_message("nope", "hi", &MessageParams::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("channel_not_found"));
    }

    #[tokio::test]
    async fn http_failure_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth.test")
            .with_status(500)
            .create_async()
            .await;

        let err = api(&server).auth_test().await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn open_socket_connection_uses_app_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/apps.connections.open")
            .match_header("authorization", "Bearer xapp-test")
            .with_body(r#"{"ok":true,"url":"wss://example.invalid/link"}"#)
            .create_async()
            .await;

        let url = api(&server)
            .open_socket_connection(&Secret::new("xapp-test".to_string()))
            .await
            .unwrap();
        assert_eq!(url, "wss://example.invalid/link");
        mock.assert_async().await;
    }
}
