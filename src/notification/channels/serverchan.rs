//! Server酱 渠道，支持多个 SendKey

use reqwest::blocking::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, read_json};

/// Server酱 配置
#[derive(Debug, Clone, PartialEq)]
pub struct ServerChanConfig {
    /// 逗号分隔的 SendKey，已去空白和空项
    pub keys: Vec<String>,
}

impl ServerChanConfig {
    /// 解析逗号分隔的 key 列表，全为空时返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        let keys: Vec<String> = raw
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            None
        } else {
            Some(Self { keys })
        }
    }
}

pub struct ServerChanChannel {
    config: Option<ServerChanConfig>,
    client: Client,
}

impl ServerChanChannel {
    pub fn new(config: Option<ServerChanConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn endpoint(key: &str) -> String {
        format!("https://sctapi.ftqq.com/{}.send", key)
    }

    fn send_one(&self, key: &str, title: &str, body: &str) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(Self::endpoint(key))
            .form(&[("title", title), ("desp", body)])
            .send()?;
        let result = read_json(response)?;
        expect_field(&result, "code", json!(0), "message")
    }
}

/// 日志中只显示 key 前 8 位
fn mask_key(key: &str) -> String {
    key.chars().take(8).collect()
}

impl ChannelSender for ServerChanChannel {
    fn name(&self) -> &str {
        "serverchan"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// 任一 key 成功即视为送达；全部失败时返回最后一个错误以触发重试
    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let mut delivered = false;
        let mut last_error = None;
        for key in &config.keys {
            match self.send_one(key, title, body) {
                Ok(()) => {
                    debug!(channel = "serverchan", key = %mask_key(key), "Message sent");
                    delivered = true;
                }
                Err(e) => {
                    warn!(channel = "serverchan", key = %mask_key(key), error = %e, "Key rejected");
                    last_error = Some(e);
                }
            }
        }

        match (delivered, last_error) {
            (true, _) => Ok(SendResult::Delivered),
            (false, Some(e)) => Err(e),
            (false, None) => Ok(not_configured()),
        }
    }
}
