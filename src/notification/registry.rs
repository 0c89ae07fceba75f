//! 渠道注册表 - 主渠道加有序的报警渠道列表

use reqwest::blocking::Client;
use std::sync::Arc;
use tracing::info;

use super::channel::ChannelSender;
use super::channels::*;
use crate::config::ChannelsConfig;

/// 渠道注册表
///
/// 主渠道（Telegram）不会出现在报警列表中。所有渠道都会注册，
/// 是否真正发送由分发器根据 `is_configured` 决定。
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    primary: Option<Arc<dyn ChannelSender>>,
    alerts: Vec<Arc<dyn ChannelSender>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置主渠道
    pub fn with_primary(mut self, channel: Arc<dyn ChannelSender>) -> Self {
        self.primary = Some(channel);
        self
    }

    /// 追加报警渠道（保持注册顺序）
    pub fn register_alert(&mut self, channel: Arc<dyn ChannelSender>) {
        self.alerts.push(channel);
    }

    /// 按固定顺序注册全部内置渠道
    pub fn from_config(config: &ChannelsConfig, client: Client) -> Self {
        let c = || client.clone();
        let mut registry = Self::new().with_primary(Arc::new(TelegramChannel::new(
            config.telegram.clone(),
            c(),
        )));

        let alerts: Vec<Arc<dyn ChannelSender>> = vec![
            Arc::new(ServerChanChannel::new(config.serverchan.clone(), c())),
            Arc::new(EmailChannel::new(config.email.clone())),
            Arc::new(BarkChannel::new(config.bark.clone(), c())),
            Arc::new(DingTalkChannel::new(config.dingtalk.clone(), c())),
            Arc::new(FeishuChannel::new(config.feishu.clone(), c())),
            Arc::new(GoCqhttpChannel::new(config.gocqhttp.clone(), c())),
            Arc::new(GotifyChannel::new(config.gotify.clone(), c())),
            Arc::new(IgotChannel::new(config.igot.clone(), c())),
            Arc::new(PushDeerChannel::new(config.pushdeer.clone(), c())),
            Arc::new(SynologyChatChannel::new(config.synology_chat.clone(), c())),
            Arc::new(PushPlusChannel::new(config.pushplus.clone(), c())),
            Arc::new(WeComChannel::new(config.wecom.clone(), c())),
            Arc::new(QmsgChannel::new(config.qmsg.clone(), c())),
            Arc::new(AibotkChannel::new(config.aibotk.clone(), c())),
            Arc::new(PushMeChannel::new(config.pushme.clone(), c())),
            Arc::new(ChronocatChannel::new(config.chronocat.clone(), c())),
            Arc::new(NtfyChannel::new(config.ntfy.clone(), c())),
            Arc::new(WebhookChannel::new(config.webhook.clone(), c())),
        ];
        for channel in alerts {
            registry.register_alert(channel);
        }

        info!(
            configured = ?config.configured_names(),
            total = registry.channel_count(),
            "Notification channels registered"
        );
        registry
    }

    pub fn primary(&self) -> Option<&Arc<dyn ChannelSender>> {
        self.primary.as_ref()
    }

    pub fn alerts(&self) -> &[Arc<dyn ChannelSender>] {
        &self.alerts
    }

    /// 已注册的渠道数量（含主渠道）
    pub fn channel_count(&self) -> usize {
        self.alerts.len() + usize::from(self.primary.is_some())
    }

    /// 已注册的渠道名称，主渠道在前
    pub fn channel_names(&self) -> Vec<&str> {
        self.primary
            .iter()
            .chain(self.alerts.iter())
            .map(|c| c.name())
            .collect()
    }
}
