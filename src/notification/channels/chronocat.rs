//! Chronocat 渠道（QQ 私聊，Red Protocol）

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_status, join_title, trim_base};

#[derive(Debug, Clone, PartialEq)]
pub struct ChronocatConfig {
    pub url: String,
    pub target: String,
    pub token: Option<String>,
}

pub struct ChronocatChannel {
    config: Option<ChronocatConfig>,
    client: Client,
}

impl ChronocatChannel {
    pub fn new(config: Option<ChronocatConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn payload(config: &ChronocatConfig, title: &str, body: &str) -> Value {
        json!({
            "peer": { "chatType": 1, "peerUin": config.target },
            "elements": [
                { "elementType": 1, "textElement": { "content": join_title(title, body) } }
            ],
        })
    }
}

impl ChannelSender for ChronocatChannel {
    fn name(&self) -> &str {
        "chronocat"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let mut request = self
            .client
            .post(format!("{}/api/message/send", trim_base(&config.url)))
            .json(&Self::payload(config, title, body));
        if let Some(token) = &config.token {
            request = request.bearer_auth(token);
        }

        expect_status(request.send()?, &[200])?;
        debug!(channel = "chronocat", target = %config.target, "Message sent");
        Ok(SendResult::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let config = ChronocatConfig {
            url: "http://127.0.0.1:16530".to_string(),
            target: "10001".to_string(),
            token: None,
        };
        let payload = ChronocatChannel::payload(&config, "T", "B");
        assert_eq!(payload["peer"]["peerUin"], "10001");
        assert_eq!(payload["elements"][0]["textElement"]["content"], "T\n\nB");
    }
}
