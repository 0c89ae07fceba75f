//! go-cqhttp 渠道（QQ 私聊）

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, join_title, read_json, trim_base};

#[derive(Debug, Clone, PartialEq)]
pub struct GoCqhttpConfig {
    pub url: String,
    /// 目标 QQ 号
    pub target: String,
    pub token: Option<String>,
}

pub struct GoCqhttpChannel {
    config: Option<GoCqhttpConfig>,
    client: Client,
}

impl GoCqhttpChannel {
    pub fn new(config: Option<GoCqhttpConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn payload(config: &GoCqhttpConfig, title: &str, body: &str) -> Value {
        json!({
            "user_id": config.target,
            "message": join_title(title, body),
        })
    }
}

impl ChannelSender for GoCqhttpChannel {
    fn name(&self) -> &str {
        "gocqhttp"
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
            .post(format!("{}/send_private_msg", trim_base(&config.url)))
            .json(&Self::payload(config, title, body));
        if let Some(token) = &config.token {
            request = request.bearer_auth(token);
        }

        let result = read_json(request.send()?)?;
        expect_field(&result, "status", json!("ok"), "message")?;
        debug!(channel = "gocqhttp", target = %config.target, "Message sent");
        Ok(SendResult::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload() {
        let config = GoCqhttpConfig {
            url: "http://127.0.0.1:5700".to_string(),
            target: "10001".to_string(),
            token: None,
        };
        let payload = GoCqhttpChannel::payload(&config, "T", "B");
        assert_eq!(payload["user_id"], "10001");
        assert_eq!(payload["message"], "T\n\nB");
    }
}
