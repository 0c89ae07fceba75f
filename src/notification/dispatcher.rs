//! 通知分发器 - 逐个渠道发送并隔离故障

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, info};

use super::channel::{ChannelOutcome, ChannelSender, DispatchResult, Notice, SendResult};
use super::registry::ChannelRegistry;
use crate::retry::{RetryExecutor, RetryPolicy};

/// 分发引擎
///
/// 顺序发送。任何渠道失败（包括重试耗尽或适配器 panic）都只影响自己的结果，
/// 后续渠道照常发送。
pub struct DispatchEngine {
    registry: ChannelRegistry,
    executor: RetryExecutor,
    policy: RetryPolicy,
    /// 是否为 dry-run 模式
    dry_run: bool,
}

impl DispatchEngine {
    pub fn new(registry: ChannelRegistry) -> Self {
        Self {
            registry,
            executor: RetryExecutor::default(),
            policy: RetryPolicy::channel_send(),
            dry_run: false,
        }
    }

    /// 替换重试执行器（测试注入记录型 sleeper）
    pub fn with_executor(mut self, executor: RetryExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 设置 dry-run 模式
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// 发送到主渠道及全部报警渠道
    pub fn dispatch_all(&self, notice: &Notice) -> Vec<ChannelOutcome> {
        info!(title = %notice.title, "Dispatching to all channels");
        let mut outcomes = self.dispatch_primary(notice);
        for channel in self.registry.alerts() {
            outcomes.push(self.deliver(channel.as_ref(), &notice.title, &notice.body));
        }
        outcomes
    }

    /// 只发送到主渠道
    pub fn dispatch_primary(&self, notice: &Notice) -> Vec<ChannelOutcome> {
        self.registry
            .primary()
            .map(|channel| self.deliver(channel.as_ref(), &notice.title, &notice.markup_body))
            .into_iter()
            .collect()
    }

    fn deliver(&self, channel: &dyn ChannelSender, title: &str, body: &str) -> ChannelOutcome {
        let name = channel.name().to_string();

        if !channel.is_configured() {
            debug!(channel = %name, "Channel not configured, skipping");
            return ChannelOutcome::new(name, DispatchResult::Skipped("not configured".to_string()));
        }

        if self.dry_run {
            info!(channel = %name, "[dry-run] Would send notification");
            return ChannelOutcome::new(name, DispatchResult::Skipped("dry-run".to_string()));
        }

        let attempt = catch_unwind(AssertUnwindSafe(|| {
            self.executor
                .execute(&name, &self.policy, |_| channel.send(title, body))
        }));

        let result = match attempt {
            Ok(Ok(SendResult::Delivered)) => {
                info!(channel = %name, "Notification delivered");
                DispatchResult::Delivered
            }
            Ok(Ok(SendResult::Skipped(reason))) => {
                debug!(channel = %name, reason = %reason, "Channel skipped");
                DispatchResult::Skipped(reason)
            }
            Ok(Err(exhausted)) => {
                error!(
                    channel = %name,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "Notification failed"
                );
                DispatchResult::Failed(exhausted.last_error.to_string())
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!(channel = %name, error = %reason, "Channel panicked");
                DispatchResult::Failed(format!("panic: {}", reason))
            }
        };

        ChannelOutcome::new(name, result)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
