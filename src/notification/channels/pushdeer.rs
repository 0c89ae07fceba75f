//! PushDeer 渠道

use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, read_json};

const ENDPOINT: &str = "https://api2.pushdeer.com/message/push";

#[derive(Debug, Clone, PartialEq)]
pub struct PushDeerConfig {
    pub key: String,
}

pub struct PushDeerChannel {
    config: Option<PushDeerConfig>,
    client: Client,
}

impl PushDeerChannel {
    pub fn new(config: Option<PushDeerConfig>, client: Client) -> Self {
        Self { config, client }
    }
}

impl ChannelSender for PushDeerChannel {
    fn name(&self) -> &str {
        "pushdeer"
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
            .form(&[
                ("pushkey", config.key.as_str()),
                ("text", title),
                ("desp", body),
                ("type", "text"),
            ])
            .send()?;

        let result = read_json(response)?;
        expect_field(&result, "code", json!(0), "error")?;
        debug!(channel = "pushdeer", "Push sent");
        Ok(SendResult::Delivered)
    }
}
