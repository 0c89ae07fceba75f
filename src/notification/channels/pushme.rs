//! PushMe 渠道，成功时响应体为字面量 `success`

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};

const ENDPOINT: &str = "https://push.i-i.me/";

#[derive(Debug, Clone, PartialEq)]
pub struct PushMeConfig {
    pub key: String,
}

pub struct PushMeChannel {
    config: Option<PushMeConfig>,
    client: Client,
}

impl PushMeChannel {
    pub fn new(config: Option<PushMeConfig>, client: Client) -> Self {
        Self { config, client }
    }
}

fn check_body(text: &str) -> Result<(), ChannelError> {
    if text == "success" {
        Ok(())
    } else {
        Err(ChannelError::Protocol(text.to_string()))
    }
}

impl ChannelSender for PushMeChannel {
    fn name(&self) -> &str {
        "pushme"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let text = self
            .client
            .post(ENDPOINT)
            .form(&[
                ("push_key", config.key.as_str()),
                ("title", title),
                ("content", body),
            ])
            .send()?
            .text()?;

        check_body(&text)?;
        debug!(channel = "pushme", "Push sent");
        Ok(SendResult::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_body_literal() {
        assert!(check_body("success").is_ok());
        assert!(matches!(check_body("key error"), Err(ChannelError::Protocol(_))));
        assert!(check_body("success\n").is_err());
    }
}
