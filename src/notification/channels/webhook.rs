//! 自定义 Webhook 渠道
//!
//! 方法、请求头和请求体模板都在启动时校验，发送阶段只做替换。
//! 模板中的 `{{title}}` / `{{content}}` 以 JSON 字符串转义后代入，
//! 所以模板里应写成 `"{{title}}"` 这种带引号的形式。

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{ChannelError, ConfigError};
use crate::notification::channel::{not_configured, ChannelSender, SendResult};
use crate::notification::http::expect_status;

const ACCEPTED_STATUS: &[u16] = &[200, 201, 204];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebhookMethod {
    Get,
    #[default]
    Post,
}

impl FromStr for WebhookMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(WebhookMethod::Get),
            "POST" => Ok(WebhookMethod::Post),
            other => Err(ConfigError::Invalid {
                name: "WEBHOOK_METHOD".to_string(),
                reason: format!("unsupported method '{}', expected GET or POST", other),
            }),
        }
    }
}

impl fmt::Display for WebhookMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookMethod::Get => write!(f, "GET"),
            WebhookMethod::Post => write!(f, "POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    pub url: String,
    pub method: WebhookMethod,
    pub headers: HeaderMap,
    pub body_template: Option<String>,
}

impl WebhookConfig {
    /// 从原始环境变量值构造并校验配置
    pub fn parse(
        url: String,
        method: Option<&str>,
        headers: Option<&str>,
        body_template: Option<String>,
    ) -> Result<Self, ConfigError> {
        let method = match method {
            Some(raw) => raw.parse()?,
            None => WebhookMethod::default(),
        };
        let headers = match headers {
            Some(raw) => parse_headers(raw)?,
            None => HeaderMap::new(),
        };
        if let Some(template) = &body_template {
            render_template(template, "title", "content").map_err(|e| ConfigError::Invalid {
                name: "WEBHOOK_BODY_TEMPLATE".to_string(),
                reason: e.to_string(),
            })?;
        }

        Ok(Self {
            url,
            method,
            headers,
            body_template,
        })
    }

    /// 生成请求数据，未设置模板时为 `{title, content}`
    pub fn render(&self, title: &str, body: &str) -> Result<Value, ChannelError> {
        match &self.body_template {
            Some(template) => render_template(template, title, body),
            None => Ok(json!({ "title": title, "content": body })),
        }
    }
}

fn parse_headers(raw: &str) -> Result<HeaderMap, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "WEBHOOK_HEADERS".to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(invalid("expected a JSON object".to_string()));
    };

    let mut headers = HeaderMap::new();
    for (name, value) in map {
        let text = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| invalid(format!("header name '{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(&text)
            .map_err(|e| invalid(format!("header '{}': {}", name, e)))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// 转义为 JSON 字符串内容（不含两侧引号）
fn escape_json(s: &str) -> String {
    let quoted = Value::String(s.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

fn render_template(template: &str, title: &str, body: &str) -> Result<Value, ChannelError> {
    let rendered = template
        .replace("{{title}}", &escape_json(title))
        .replace("{{content}}", &escape_json(body));
    serde_json::from_str(&rendered)
        .map_err(|e| ChannelError::Payload(format!("body template is not valid JSON: {}", e)))
}

fn query_pairs(data: &Value) -> Result<Vec<(String, String)>, ChannelError> {
    let Value::Object(map) = data else {
        return Err(ChannelError::Payload(
            "GET webhook requires a JSON object to build query parameters".to_string(),
        ));
    };
    Ok(map
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect())
}

pub struct WebhookChannel {
    config: Option<WebhookConfig>,
    client: Client,
}

impl WebhookChannel {
    pub fn new(config: Option<WebhookConfig>, client: Client) -> Self {
        Self { config, client }
    }
}

impl ChannelSender for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError> {
        let Some(config) = &self.config else {
            return Ok(not_configured());
        };

        let data = config.render(title, body)?;
        let request = match config.method {
            WebhookMethod::Get => self.client.get(&config.url).query(&query_pairs(&data)?),
            WebhookMethod::Post => self.client.post(&config.url).json(&data),
        };

        expect_status(request.headers(config.headers.clone()).send()?, ACCEPTED_STATUS)?;
        debug!(channel = "webhook", method = %config.method, "Webhook delivered");
        Ok(SendResult::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::http::build_client;
    use crate::notification::http::mock_server::{closed_url, respond_once};

    fn parse(
        method: Option<&str>,
        headers: Option<&str>,
        template: Option<&str>,
    ) -> Result<WebhookConfig, ConfigError> {
        WebhookConfig::parse(
            "https://hook.example.com".to_string(),
            method,
            headers,
            template.map(|t| t.to_string()),
        )
    }

    #[test]
    fn test_method_defaults_to_post() {
        let config = parse(None, None, None).unwrap();
        assert_eq!(config.method, WebhookMethod::Post);
        assert_eq!(parse(Some("get"), None, None).unwrap().method, WebhookMethod::Get);
    }

    #[test]
    fn test_unsupported_method_is_config_error() {
        let err = parse(Some("PUT"), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref name, .. } if name == "WEBHOOK_METHOD"));
    }

    #[test]
    fn test_headers_must_be_object() {
        assert!(parse(None, Some("[1,2]"), None).is_err());
        assert!(parse(None, Some("not json"), None).is_err());

        let config = parse(None, Some(r#"{"X-Token": "abc", "X-Retry": 3}"#), None).unwrap();
        assert_eq!(config.headers.get("x-token").unwrap(), "abc");
        assert_eq!(config.headers.get("x-retry").unwrap(), "3");
    }

    #[test]
    fn test_invalid_template_rejected_at_startup() {
        let err = parse(None, None, Some("{\"text\": {{content}}")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref name, .. } if name == "WEBHOOK_BODY_TEMPLATE"));
    }

    #[test]
    fn test_template_escapes_newlines_and_quotes() {
        let config = parse(
            None,
            None,
            Some(r#"{"msg": "{{title}}", "detail": {"text": "{{content}}"}}"#),
        )
        .unwrap();
        let data = config.render("标题 \"A\"", "line1\nline2").unwrap();
        assert_eq!(data["msg"], "标题 \"A\"");
        assert_eq!(data["detail"]["text"], "line1\nline2");
    }

    #[test]
    fn test_default_body() {
        let config = parse(None, None, None).unwrap();
        let data = config.render("T", "B").unwrap();
        assert_eq!(data, json!({"title": "T", "content": "B"}));
    }

    #[test]
    fn test_query_pairs() {
        let pairs = query_pairs(&json!({"title": "T", "n": 3})).unwrap();
        assert!(pairs.contains(&("title".to_string(), "T".to_string())));
        assert!(pairs.contains(&("n".to_string(), "3".to_string())));
        assert!(query_pairs(&json!([1])).is_err());
    }

    fn channel_at(url: &str, method: WebhookMethod) -> WebhookChannel {
        let config = WebhookConfig {
            url: url.to_string(),
            method,
            headers: parse_headers(r#"{"X-Token": "abc"}"#).unwrap(),
            body_template: None,
        };
        WebhookChannel::new(Some(config), build_client().unwrap())
    }

    #[test]
    fn test_send_post_created_is_delivered() {
        let (url, server) = respond_once(201, "");
        let result = channel_at(&url, WebhookMethod::Post).send("电量预警", "照明 8.0");
        assert_eq!(result.unwrap(), SendResult::Delivered);

        let request = server.join().unwrap();
        assert!(request.starts_with("POST / "));
        assert!(request.to_ascii_lowercase().contains("x-token: abc"));
        assert!(request.contains(r#""title":"电量预警""#));
    }

    #[test]
    fn test_send_get_no_content_is_delivered() {
        let (url, server) = respond_once(204, "");
        let result = channel_at(&url, WebhookMethod::Get).send("T", "B");
        assert_eq!(result.unwrap(), SendResult::Delivered);

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /?"));
        assert!(request.contains("title=T"));
        assert!(request.contains("content=B"));
    }

    #[test]
    fn test_send_server_error_is_protocol() {
        let (url, server) = respond_once(500, "boom");
        let err = channel_at(&url, WebhookMethod::Post).send("T", "B").unwrap_err();
        assert!(matches!(err, ChannelError::Protocol(ref m) if m == "HTTP 500: boom"));
        server.join().unwrap();
    }

    #[test]
    fn test_send_accepted_202_is_not_success() {
        let (url, server) = respond_once(202, "");
        let err = channel_at(&url, WebhookMethod::Post).send("T", "B").unwrap_err();
        assert!(matches!(err, ChannelError::Protocol(_)));
        server.join().unwrap();
    }

    #[test]
    fn test_send_closed_port_is_transport() {
        let err = channel_at(&closed_url(), WebhookMethod::Post)
            .send("T", "B")
            .unwrap_err();
        assert!(matches!(err, ChannelError::Transport(_)));
    }
}
