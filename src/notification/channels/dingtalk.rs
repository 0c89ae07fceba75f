//! 钉钉机器人渠道，可选加签

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, join_title, read_json};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq)]
pub struct DingTalkConfig {
    /// 完整 webhook（含 access_token）
    pub webhook: String,
    /// 加签密钥
    pub secret: Option<String>,
}

pub struct DingTalkChannel {
    config: Option<DingTalkConfig>,
    client: Client,
}

impl DingTalkChannel {
    pub fn new(config: Option<DingTalkConfig>, client: Client) -> Self {
        Self { config, client }
    }

    /// 签名：base64(HMAC-SHA256(secret, "{timestamp}\n{secret}"))
    pub fn sign(secret: &str, timestamp_ms: i64) -> Result<String, ChannelError> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| ChannelError::Payload(format!("hmac key: {}", e)))?;
        mac.update(format!("{}\n{}", timestamp_ms, secret).as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    fn signed_url(config: &DingTalkConfig, timestamp_ms: i64) -> Result<Url, ChannelError> {
        let mut url = Url::parse(&config.webhook)
            .map_err(|e| ChannelError::Payload(format!("invalid DINGTALK_WEBHOOK: {}", e)))?;
        if let Some(secret) = &config.secret {
            let sign = Self::sign(secret, timestamp_ms)?;
            url.query_pairs_mut()
                .append_pair("timestamp", &timestamp_ms.to_string())
                .append_pair("sign", &sign);
        }
        Ok(url)
    }

    fn payload(title: &str, body: &str) -> Value {
        json!({
            "msgtype": "text",
            "text": { "content": join_title(title, body) },
        })
    }
}

impl ChannelSender for DingTalkChannel {
    fn name(&self) -> &str {
        "dingtalk"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let url = Self::signed_url(config, chrono::Utc::now().timestamp_millis())?;
        let response = self.client.post(url).json(&Self::payload(title, body)).send()?;
        let result = read_json(response)?;
        expect_field(&result, "errcode", json!(0), "errmsg")?;
        debug!(channel = "dingtalk", signed = config.secret.is_some(), "Message sent");
        Ok(SendResult::Delivered)
    }
}
