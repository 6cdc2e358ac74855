use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Default Slack Web API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Configuration for a single Slack bot account.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SlackAccountConfig {
    /// Bot user OAuth token (`xoxb-...`).
    pub bot_token: Secret<String>,

    /// App-level token (`xapp-...`), required for Socket Mode.
    pub app_token: Option<Secret<String>>,

    /// Connect over Socket Mode and answer direct messages.
    pub socket_mode: bool,

    /// Web API base URL. Overridable for tests and proxies.
    pub api_base_url: String,

    /// Display name attached to every message the bot sends.
    pub username: Option<String>,

    /// Avatar URL attached to every message the bot sends.
    pub icon_url: Option<String>,

    /// Avatar emoji attached to every message the bot sends.
    pub icon_emoji: Option<String>,
}

impl SlackAccountConfig {
    /// Parse an account entry from `channels.slack.<account_id>`.
    pub fn from_value(value: serde_json::Value) -> anyhow::Result<Self> {
        let cfg: Self = serde_json::from_value(value)?;
        if cfg.bot_token.expose_secret().is_empty() {
            anyhow::bail!("Slack bot_token is required");
        }
        if cfg.socket_mode
            && cfg
                .app_token
                .as_ref()
                .is_none_or(|t| t.expose_secret().is_empty())
        {
            anyhow::bail!("Slack app_token is required for socket_mode");
        }
        Ok(cfg)
    }

    /// Extra fields merged into every `chat.postMessage` call.
    pub fn message_params(&self) -> MessageParams {
        MessageParams {
            username: self.username.clone(),
            icon_url: self.icon_url.clone(),
            icon_emoji: self.icon_emoji.clone(),
        }
    }
}

impl Default for SlackAccountConfig {
    fn default() -> Self {
        Self {
            bot_token: Secret::new(String::new()),
            app_token: None,
            socket_mode: false,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            username: None,
            icon_url: None,
            icon_emoji: None,
        }
    }
}

impl std::fmt::Debug for SlackAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackAccountConfig")
            .field("bot_token", &"[REDACTED]")
            .field("app_token", &self.app_token.as_ref().map(|_| "[REDACTED]"))
            .field("socket_mode", &self.socket_mode)
            .field("api_base_url", &self.api_base_url)
            .field("username", &self.username)
            .field("icon_url", &self.icon_url)
            .field("icon_emoji", &self.icon_emoji)
            .finish()
    }
}

/// Presentation fields sent along with every outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MessageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn parses_account_with_defaults() {
        let cfg = SlackAccountConfig::from_value(json!({
            "bot_token": "xoxb-1",
            "icon_url": "https://example.com/bot.png",
        }))
        .unwrap();
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert!(!cfg.socket_mode);
        assert_eq!(cfg.message_params(), MessageParams {
            username: None,
            icon_url: Some("https://example.com/bot.png".into()),
            icon_emoji: None,
        });
    }

    #[test]
    fn bot_token_is_required() {
        let err = SlackAccountConfig::from_value(json!({})).unwrap_err();
        assert!(err.to_string().contains("bot_token"));
    }

    #[test]
    fn socket_mode_requires_app_token() {
        let err = SlackAccountConfig::from_value(json!({
            "bot_token": "xoxb-1",
            "socket_mode": true,
        }))
        .unwrap_err();
        assert!(err.to_string().contains("app_token"));
    }

    #[test]
    fn debug_redacts_tokens() {
        let cfg = SlackAccountConfig::from_value(json!({
            "bot_token": "xoxb-secret",
            "app_token": "xapp-secret",
            "socket_mode": true,
        }))
        .unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("[REDACTED]"));
    }
}
