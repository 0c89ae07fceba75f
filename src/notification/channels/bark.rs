//! Bark 渠道（iOS 推送）

use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::json;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, read_json};

pub const DEFAULT_BARK_URL: &str = "https://api.day.app";

#[derive(Debug, Clone, PartialEq)]
pub struct BarkConfig {
    /// 服务地址，未配置时为官方服务器
    pub server: String,
    pub key: String,
}

pub struct BarkChannel {
    config: Option<BarkConfig>,
    client: Client,
}

impl BarkChannel {
    pub fn new(config: Option<BarkConfig>, client: Client) -> Self {
        Self { config, client }
    }

    /// `{server}/{key}/{title}/{body}`，各段做百分号编码
    fn endpoint(config: &BarkConfig, title: &str, body: &str) -> Result<Url, ChannelError> {
        let mut url = Url::parse(&config.server)
            .map_err(|e| ChannelError::Payload(format!("invalid BARK_URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ChannelError::Payload("BARK_URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&config.key)
            .push(title)
            .push(body);
        Ok(url)
    }
}

impl ChannelSender for BarkChannel {
    fn name(&self) -> &str {
        "bark"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let url = Self::endpoint(config, title, body)?;
        let result = read_json(self.client.get(url).send()?)?;
        expect_field(&result, "code", json!(200), "message")?;
        debug!(channel = "bark", "Push sent");
        Ok(SendResult::Delivered)
    }
}
