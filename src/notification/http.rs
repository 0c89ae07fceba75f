//! 渠道共用的 HTTP 工具
//!
//! 所有渠道共享同一个阻塞客户端，固定 10 秒超时。

use anyhow::{anyhow, Result};
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use std::time::Duration;

use crate::error::ChannelError;

/// 单次请求超时，与重试策略的等待无关
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 创建共享 HTTP 客户端
pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| anyhow!("Cannot create HTTP client: {}", e))
}

/// 标题与正文拼成单段文本（不支持独立标题的渠道使用）
pub fn join_title(title: &str, body: &str) -> String {
    format!("{}\n\n{}", title, body)
}

/// 读取 JSON 响应体
pub fn read_json(response: Response) -> Result<Value, ChannelError> {
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| ChannelError::Transport(format!("failed to read response: {}", e)))?;
    serde_json::from_str(&text).map_err(|e| {
        ChannelError::Protocol(format!("non-JSON response ({}): {} - body: {}", status, e, text))
    })
}

/// 要求 JSON 中 `field` 等于 `expected`，否则以 `message_field` 作为拒绝原因
pub fn expect_field(
    body: &Value,
    field: &str,
    expected: Value,
    message_field: &str,
) -> Result<(), ChannelError> {
    if body.get(field) == Some(&expected) {
        return Ok(());
    }
    let reason = match body.get(message_field) {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => body.to_string(),
    };
    Err(ChannelError::Protocol(format!(
        "{}={} ({})",
        field,
        body.get(field).map(|v| v.to_string()).unwrap_or_else(|| "null".to_string()),
        reason
    )))
}

/// 要求 HTTP 状态码在 `accepted` 之内
pub fn expect_status(response: Response, accepted: &[u16]) -> Result<(), ChannelError> {
    let status = response.status().as_u16();
    if accepted.contains(&status) {
        return Ok(());
    }
    let text = response.text().unwrap_or_default();
    Err(ChannelError::Protocol(format!("HTTP {}: {}", status, text)))
}

/// 去掉 base URL 末尾的斜杠，便于拼接路径
pub fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expect_field_match() {
        let body = json!({"code": 0, "message": "ok"});
        assert!(expect_field(&body, "code", json!(0), "message").is_ok());
    }

    #[test]
    fn test_expect_field_rejects_with_reason() {
        let body = json!({"errcode": 310000, "errmsg": "sign not match"});
        let err = expect_field(&body, "errcode", json!(0), "errmsg").unwrap_err();
        match err {
            ChannelError::Protocol(msg) => {
                assert!(msg.contains("310000"));
                assert!(msg.contains("sign not match"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_expect_field_missing() {
        let body = json!({"other": 1});
        assert!(matches!(
            expect_field(&body, "ok", json!(true), "description"),
            Err(ChannelError::Protocol(_))
        ));
    }

    #[test]
    fn test_join_title_and_trim() {
        assert_eq!(join_title("T", "B"), "T\n\nB");
        assert_eq!(trim_base("https://ntfy.sh/"), "https://ntfy.sh");
    }

    #[test]
    fn test_expect_status_accepts_listed_codes() {
        let (url, server) = mock_server::respond_once(201, "");
        let response = build_client().unwrap().post(&url).send().unwrap();
        assert!(expect_status(response, &[200, 201, 204]).is_ok());
        server.join().unwrap();
    }

    #[test]
    fn test_expect_status_rejects_with_body() {
        let (url, server) = mock_server::respond_once(503, "maintenance");
        let response = build_client().unwrap().get(&url).send().unwrap();
        match expect_status(response, &[200]).unwrap_err() {
            ChannelError::Protocol(msg) => assert_eq!(msg, "HTTP 503: maintenance"),
            other => panic!("unexpected error: {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_read_json_non_json_is_protocol() {
        let (url, server) = mock_server::respond_once(200, "<html>oops</html>");
        let response = build_client().unwrap().get(&url).send().unwrap();
        assert!(matches!(read_json(response), Err(ChannelError::Protocol(_))));
        server.join().unwrap();
    }
}
