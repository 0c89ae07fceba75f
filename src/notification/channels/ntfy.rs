//! ntfy 渠道，正文为原始请求体，标题走 `Title` 头

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::blocking::Client;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_status, trim_base};

pub const DEFAULT_NTFY_URL: &str = "https://ntfy.sh";

#[derive(Debug, Clone, PartialEq)]
pub struct NtfyConfig {
    pub server: String,
    pub topic: String,
    pub token: Option<String>,
}

pub struct NtfyChannel {
    config: Option<NtfyConfig>,
    client: Client,
}

impl NtfyChannel {
    pub fn new(config: Option<NtfyConfig>, client: Client) -> Self {
        Self { config, client }
    }
}

/// HTTP 头只能放 ASCII，非 ASCII 标题按 RFC 2047 编码（ntfy 支持）
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", BASE64.encode(value.as_bytes()))
    }
}

impl ChannelSender for NtfyChannel {
    fn name(&self) -> &str {
        "ntfy"
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
            .post(format!("{}/{}", trim_base(&config.server), config.topic))
            .header("Title", encode_header(title))
            .body(body.as_bytes().to_vec());
        if let Some(token) = &config.token {
            request = request.bearer_auth(token);
        }

        expect_status(request.send()?, &[200])?;
        debug!(channel = "ntfy", topic = %config.topic, "Message published");
        Ok(SendResult::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_header() {
        assert_eq!(encode_header("plain"), "plain");
        let encoded = encode_header("宿舍");
        assert!(encoded.starts_with("=?UTF-8?B?"));
        assert!(encoded.ends_with("?="));
        assert!(encoded.is_ascii());
    }
}
