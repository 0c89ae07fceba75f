//! 智能微秘书 (Aibotk) 渠道

use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, join_title, read_json};

const ENDPOINT: &str = "https://api-bot.aibotk.com/openapi/v1/chat/send";

#[derive(Debug, Clone, PartialEq)]
pub struct AibotkConfig {
    pub key: String,
    pub target: String,
}

pub struct AibotkChannel {
    config: Option<AibotkConfig>,
    client: Client,
}

impl AibotkChannel {
    pub fn new(config: Option<AibotkConfig>, client: Client) -> Self {
        Self { config, client }
    }
}

impl ChannelSender for AibotkChannel {
    fn name(&self) -> &str {
        "aibotk"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let response = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&config.key)
            .json(&json!({
                "to": config.target,
                "type": 1,
                "content": join_title(title, body),
            }))
            .send()?;

        let result = read_json(response)?;
        expect_field(&result, "code", json!(0), "message")?;
        debug!(channel = "aibotk", target = %config.target, "Message sent");
        Ok(SendResult::Delivered)
    }
}
