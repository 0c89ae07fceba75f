//! 企业微信应用消息渠道
//!
//! 两步流程：先用 corpid/corpsecret 换取 access_token，再用它发送消息。
//! 任一步的 `errcode != 0` 都视为拒绝。

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, join_title, read_json};

const API_BASE: &str = "https://qyapi.weixin.qq.com/cgi-bin";

#[derive(Debug, Clone, PartialEq)]
pub struct WeComConfig {
    pub corp_id: String,
    pub agent_id: String,
    pub secret: String,
    /// 接收人，默认 `@all`
    pub to_user: String,
}

pub struct WeComChannel {
    config: Option<WeComConfig>,
    client: Client,
}

impl WeComChannel {
    pub fn new(config: Option<WeComConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn fetch_token(&self, config: &WeComConfig) -> Result<String, ChannelError> {
        let response = self
            .client
            .get(format!("{}/gettoken", API_BASE))
            .query(&[
                ("corpid", config.corp_id.as_str()),
                ("corpsecret", config.secret.as_str()),
            ])
            .send()?;

        let result = read_json(response)?;
        expect_field(&result, "errcode", json!(0), "errmsg")?;
        result
            .get("access_token")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ChannelError::Protocol("gettoken response has no access_token".to_string()))
    }

    fn payload(config: &WeComConfig, title: &str, body: &str) -> Value {
        // agentid 为整数时按数字发送
        let agent_id = config
            .agent_id
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(config.agent_id.clone()));

        json!({
            "touser": config.to_user,
            "msgtype": "text",
            "agentid": agent_id,
            "text": { "content": join_title(title, body) },
        })
    }
}

impl ChannelSender for WeComChannel {
    fn name(&self) -> &str {
        "wecom"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let token = self.fetch_token(config)?;
        let response = self
            .client
            .post(format!("{}/message/send", API_BASE))
            .query(&[("access_token", token.as_str())])
            .json(&Self::payload(config, title, body))
            .send()?;

        let result = read_json(response)?;
        expect_field(&result, "errcode", json!(0), "errmsg")?;
        debug!(channel = "wecom", to_user = %config.to_user, "Message sent");
        Ok(SendResult::Delivered)
    }
}
