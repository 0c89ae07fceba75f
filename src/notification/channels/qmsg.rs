//! Qmsg酱 渠道

use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::{expect_field, join_title, read_json};

#[derive(Debug, Clone, PartialEq)]
pub struct QmsgConfig {
    pub key: String,
    /// 指定接收 QQ，缺省时发给 key 绑定的默认号
    pub qq: Option<String>,
}

pub struct QmsgChannel {
    config: Option<QmsgConfig>,
    client: Client,
}

impl QmsgChannel {
    pub fn new(config: Option<QmsgConfig>, client: Client) -> Self {
        Self { config, client }
    }

    fn form(config: &QmsgConfig, title: &str, body: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![("msg", join_title(title, body))];
        if let Some(qq) = &config.qq {
            form.push(("qq", qq.clone()));
        }
        form
    }
}

impl ChannelSender for QmsgChannel {
    fn name(&self) -> &str {
        "qmsg"
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
            .post(format!("https://qmsg.zendee.cn/send/{}", config.key))
            .form(&Self::form(config, title, body))
            .send()?;

        let result = read_json(response)?;
        expect_field(&result, "code", json!(0), "reason")?;
        debug!(channel = "qmsg", "Message sent");
        Ok(SendResult::Delivered)
    }
}
