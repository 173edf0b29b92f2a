//! Telegram Bot API configuration for shipping dump artifacts.

use std::fmt;

use serde::{Deserialize, Serialize};

fn default_api_base() -> String {
    String::from("https://api.telegram.org")
}

/// Default request timeout, in seconds.
const fn default_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token from `@BotFather`.
    #[serde(default, deserialize_with = "crate::lenient::string")]
    pub bot_token: String,

    /// Target chat. Channel and group ids are negative numbers.
    #[serde(default, deserialize_with = "crate::lenient::string")]
    pub chat_id: String,

    /// Bot API root. Override for a self-hosted Bot API server.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    /// Shipping is enabled only when both the token and the chat id are set.
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    /// `sendDocument` endpoint for the configured bot.
    pub fn send_document_url(&self) -> String {
        format!(
            "{}/bot{}/sendDocument",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field(
                "bot_token",
                &if self.bot_token.is_empty() { "" } else { "<redacted>" },
            )
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = TelegramConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn needs_both_token_and_chat() {
        let config = TelegramConfig {
            bot_token: "123:abc".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());

        let config = TelegramConfig {
            bot_token: "123:abc".into(),
            chat_id: "-10042".into(),
            ..Default::default()
        };
        assert!(config.is_configured());
    }

    #[test]
    fn send_document_url_tolerates_trailing_slash() {
        let config = TelegramConfig {
            bot_token: "123:abc".into(),
            api_base: "http://127.0.0.1:9999/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.send_document_url(),
            "http://127.0.0.1:9999/bot123:abc/sendDocument"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let config = TelegramConfig {
            bot_token: "123:secret".into(),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("secret"));
    }
}
