//! 邮件渠道（SMTP over TLS，发给自己）

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::debug;

use crate::error::ChannelError;
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::REQUEST_TIMEOUT;

/// 邮件配置
#[derive(Debug, Clone, PartialEq)]
pub struct EmailConfig {
    /// 发件人兼收件人
    pub address: String,
    /// SMTP 授权码
    pub smtp_code: String,
    /// SMTP 服务器（465 端口隐式 TLS）
    pub smtp_server: String,
}

pub struct EmailChannel {
    config: Option<EmailConfig>,
}

impl EmailChannel {
    pub fn new(config: Option<EmailConfig>) -> Self {
        Self { config }
    }

    fn build_message(config: &EmailConfig, title: &str, body: &str) -> Result<Message, ChannelError> {
        let mailbox: Mailbox = config
            .address
            .parse()
            .map_err(|e| ChannelError::Payload(format!("invalid address: {}", e)))?;

        Message::builder()
            .from(mailbox.clone())
            .to(mailbox)
            .subject(title)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| ChannelError::Payload(format!("build email: {}", e)))
    }
}

impl ChannelSender for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let email = Self::build_message(config, title, body)?;
        let mailer = SmtpTransport::relay(&config.smtp_server)
            .map_err(|e| ChannelError::Transport(format!("SMTP relay: {}", e)))?
            .credentials(Credentials::new(config.address.clone(), config.smtp_code.clone()))
            .timeout(Some(REQUEST_TIMEOUT))
            .build();

        mailer.send(&email).map_err(|e| {
            if e.is_permanent() {
                ChannelError::Protocol(format!("SMTP rejected: {}", e))
            } else {
                ChannelError::Transport(format!("SMTP send: {}", e))
            }
        })?;

        debug!(channel = "email", to = %config.address, "Mail sent");
        Ok(SendResult::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(address: &str) -> EmailConfig {
        EmailConfig {
            address: address.to_string(),
            smtp_code: "code".to_string(),
            smtp_server: "smtp.example.com".to_string(),
        }
    }

    #[test]
    fn test_build_message() {
        let message = EmailChannel::build_message(&config("me@example.com"), "标题", "正文");
        assert!(message.is_ok());
    }

    #[test]
    fn test_invalid_address_is_payload_error() {
        let result = EmailChannel::build_message(&config("not an address"), "t", "b");
        assert!(matches!(result, Err(ChannelError::Payload(_))));
    }
}
