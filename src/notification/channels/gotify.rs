//! Gotify 渠道

use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_status, trim_base};

#[derive(Debug, Clone, PartialEq)]
pub struct GotifyConfig {
    pub url: String,
    pub token: String,
}

pub struct GotifyChannel {
    config: Option<GotifyConfig>,
    client: Client,
}

impl GotifyChannel {
    pub fn new(config: Option<GotifyConfig>, client: Client) -> Self {
        Self { config, client }
    }
}

impl ChannelSender for GotifyChannel {
    fn name(&self) -> &str {
        "gotify"
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
            .post(format!("{}/message", trim_base(&config.url)))
            .header("X-Gotify-Key", config.token.as_str())
            .json(&json!({ "title": title, "message": body, "priority": 5 }))
            .send()?;

        expect_status(response, &[200])?;
        debug!(channel = "gotify", "Message sent");
        Ok(SendResult::Delivered)
    }
}
