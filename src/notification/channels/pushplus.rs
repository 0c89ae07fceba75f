//! PushPlus 渠道

use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, read_json};

const ENDPOINT: &str = "https://www.pushplus.plus/send";

#[derive(Debug, Clone, PartialEq)]
pub struct PushPlusConfig {
    pub token: String,
}

pub struct PushPlusChannel {
    config: Option<PushPlusConfig>,
    client: Client,
}

impl PushPlusChannel {
    pub fn new(config: Option<PushPlusConfig>, client: Client) -> Self {
        Self { config, client }
    }
}

impl ChannelSender for PushPlusChannel {
    fn name(&self) -> &str {
        "pushplus"
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
            .json(&json!({ "token": config.token, "title": title, "content": body }))
            .send()?;

        let result = read_json(response)?;
        expect_field(&result, "code", json!(200), "msg")?;
        debug!(channel = "pushplus", "Push sent");
        Ok(SendResult::Delivered)
    }
}
