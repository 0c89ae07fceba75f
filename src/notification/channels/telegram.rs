//! Telegram Bot 渠道（主渠道，日常通报也走这里）

use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, read_json};

const API_BASE: &str = "https://api.telegram.org";

/// Telegram 渠道配置
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

/// Telegram 渠道
///
/// 使用 MarkdownV2 解析模式，正文须由调用方预先转义。
pub struct TelegramChannel {
    config: Option<TelegramConfig>,
    client: Client,
}

impl TelegramChannel {
    pub fn new(config: Option<TelegramConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn endpoint(config: &TelegramConfig) -> String {
        format!("{}/bot{}/sendMessage", API_BASE, config.bot_token)
    }

    /// 标题加粗，空一行接正文
    fn message_text(title: &str, body: &str) -> String {
        format!("*{}*\n\n{}", title, body)
    }
}

impl ChannelSender for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let text = Self::message_text(title, body);
        let response = self
            .client
            .post(Self::endpoint(config))
            .form(&[
                ("chat_id", config.chat_id.as_str()),
                ("text", text.as_str()),
                ("parse_mode", "MarkdownV2"),
            ])
            .send()?;

        let result = read_json(response)?;
        expect_field(&result, "ok", json!(true), "description")?;
        debug!(channel = "telegram", chat_id = %config.chat_id, "Message sent");
        Ok(SendResult::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let config = TelegramConfig {
            bot_token: "123:abc".to_string(),
            chat_id: "42".to_string(),
        };
        assert_eq!(
            TelegramChannel::endpoint(&config),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_message_text_bold_title() {
        assert_eq!(TelegramChannel::message_text("标题", "正文"), "*标题*\n\n正文");
    }

    #[test]
    fn test_unconfigured_channel_skips() {
        let channel = TelegramChannel::new(None, Client::new());
        assert!(!channel.is_configured());
        assert_eq!(channel.send("t", "b").unwrap(), not_configured());
    }
}
