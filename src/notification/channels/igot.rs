//! iGot 渠道

use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, read_json};

#[derive(Debug, Clone, PartialEq)]
pub struct IgotConfig {
    pub key: String,
}

pub struct IgotChannel {
    config: Option<IgotConfig>,
    client: Client,
}

impl IgotChannel {
    pub fn new(config: Option<IgotConfig>, client: Client) -> Self {
        Self { config, client }
    }
}

impl ChannelSender for IgotChannel {
    fn name(&self) -> &str {
        "igot"
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
            .post(format!("https://push.hellyw.com/{}", config.key))
            .json(&json!({ "title": title, "content": body }))
            .send()?;

        let result = read_json(response)?;
        expect_field(&result, "ret", json!(0), "errMsg")?;
        debug!(channel = "igot", "Push sent");
        Ok(SendResult::Delivered)
    }
}
