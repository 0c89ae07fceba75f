//! Synology Chat 渠道（incoming webhook）

use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::json;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, join_title, read_json};

#[derive(Debug, Clone, PartialEq)]
pub struct SynologyChatConfig {
    pub url: String,
    pub token: String,
}

pub struct SynologyChatChannel {
    config: Option<SynologyChatConfig>,
    client: Client,
}

impl SynologyChatChannel {
    pub fn new(config: Option<SynologyChatConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn endpoint(config: &SynologyChatConfig) -> Result<Url, ChannelError> {
        let mut url = Url::parse(&config.url)
            .map_err(|e| ChannelError::Payload(format!("invalid SYNOLOGY_CHAT_URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("api", "SYNO.Chat.External")
            .append_pair("method", "incoming")
            .append_pair("version", "2")
            .append_pair("token", &config.token);
        Ok(url)
    }
}

impl ChannelSender for SynologyChatChannel {
    fn name(&self) -> &str {
        "synology_chat"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        // payload 字段本身是一段 JSON 字符串
        let payload = json!({ "text": join_title(title, body) }).to_string();
        let response = self
            .client
            .post(Self::endpoint(config)?)
            .form(&[("payload", payload.as_str())])
            .send()?;

        let result = read_json(response)?;
        expect_field(&result, "success", json!(true), "error")?;
        debug!(channel = "synology_chat", "Message sent");
        Ok(SendResult::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_query() {
        let config = SynologyChatConfig {
            url: "https://nas.local:5001/webapi/entry.cgi".to_string(),
            token: "t%1".to_string(),
        };
        let url = SynologyChatChannel::endpoint(&config).unwrap();
        assert_eq!(
            url.as_str(),
            "https://nas.local:5001/webapi/entry.cgi?api=SYNO.Chat.External&method=incoming&version=2&token=t%251"
        );
    }
}
