//! 通知渠道 trait 定义

use crate::error::ChannelError;

/// 一次分发的消息
///
/// `markup_body` 是同一内容的 MarkdownV2 转义版本，只发给主渠道。
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub markup_body: String,
}

impl Notice {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        markup_body: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            markup_body: markup_body.into(),
        }
    }
}

/// 单次发送结果
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    /// 发送成功
    Delivered,
    /// 跳过（渠道未配置或 dry-run）
    Skipped(String),
}

/// 渠道在一次分发中的最终结果，仅用于日志
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    Delivered,
    Skipped(String),
    /// 重试耗尽后的最后一次错误
    Failed(String),
}

/// 单个渠道的分发结果
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOutcome {
    pub channel_name: String,
    pub result: DispatchResult,
}

impl ChannelOutcome {
    pub fn new(channel_name: impl Into<String>, result: DispatchResult) -> Self {
        Self {
            channel_name: channel_name.into(),
            result,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.result == DispatchResult::Delivered
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.result, DispatchResult::Failed(_))
    }
}

/// 通知渠道 trait
///
/// `is_configured` 是唯一的能力判定：返回 false 时分发器直接记为 Skipped，
/// 不会调用 `send`，也不会重试。
pub trait ChannelSender: Send + Sync {
    /// 渠道名称（用于日志）
    fn name(&self) -> &str;

    /// 必需配置是否齐全
    fn is_configured(&self) -> bool;

    /// 同步发送一条消息
    fn send(&self, title: &str, body: &str) -> Result<SendResult, ChannelError>;
}

/// 未配置时的统一跳过原因
pub fn not_configured() -> SendResult {
    SendResult::Skipped("not configured".to_string())
}
