//! 飞书机器人渠道，可选签名校验

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, join_title, read_json};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq)]
pub struct FeishuConfig {
    pub webhook: String,
    pub secret: Option<String>,
}

pub struct FeishuChannel {
    config: Option<FeishuConfig>,
    client: Client,
}

impl FeishuChannel {
    pub fn new(config: Option<FeishuConfig>, client: Client) -> Self {
        Self { config, client }
    }

    /// 飞书签名以 "{timestamp}\n{secret}" 为密钥，对空消息做 HMAC
    pub fn sign(secret: &str, timestamp: i64) -> Result<String, ChannelError> {
        let key = format!("{}\n{}", timestamp, secret);
        let mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| ChannelError::Payload(format!("hmac key: {}", e)))?;
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    fn payload(
        config: &FeishuConfig,
        title: &str,
        body: &str,
        timestamp: i64,
    ) -> Result<Value, ChannelError> {
        let mut payload = json!({
            "msg_type": "text",
            "content": { "text": join_title(title, body) },
        });
        if let Some(secret) = &config.secret {
            payload["timestamp"] = json!(timestamp.to_string());
            payload["sign"] = json!(Self::sign(secret, timestamp)?);
        }
        Ok(payload)
    }
}

impl ChannelSender for FeishuChannel {
    fn name(&self) -> &str {
        "feishu"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let payload = Self::payload(config, title, body, chrono::Utc::now().timestamp())?;
        let response = self.client.post(&config.webhook).json(&payload).send()?;
        let result = read_json(response)?;
        expect_field(&result, "code", json!(0), "msg")?;
        debug!(channel = "feishu", "Message sent");
        Ok(SendResult::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: Option<&str>) -> FeishuConfig {
        FeishuConfig {
            webhook: "https://open.feishu.cn/open-apis/bot/v2/hook/x".to_string(),
            secret: secret.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_payload_without_secret() {
        let payload = FeishuChannel::payload(&config(None), "T", "B", 100).unwrap();
        assert_eq!(payload["msg_type"], "text");
        assert_eq!(payload["content"]["text"], "T\n\nB");
        assert!(payload.get("sign").is_none());
    }

    #[test]
    fn test_payload_with_secret() {
        let payload = FeishuChannel::payload(&config(Some("s")), "T", "B", 100).unwrap();
        assert_eq!(payload["timestamp"], "100");
        assert_eq!(payload["sign"], FeishuChannel::sign("s", 100).unwrap());
    }
}
