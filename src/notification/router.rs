//! 按电量分级选择通知路径
//!
//! 任一回路不足时为报警，发送到全部渠道；否则只通过主渠道做日常通报。

use tracing::info;

use super::channel::{ChannelOutcome, Notice};
use super::dispatcher::DispatchEngine;
use crate::report::ReportFormatter;
use crate::status::Thresholds;
use crate::storage::BalanceReading;

pub const ALERT_TITLE: &str = "⚠️宿舍电量预警⚠️";
pub const ALERT_SUFFIX: &str = "⚠️ 电量不足，请尽快充电！";
pub const ROUTINE_TITLE: &str = "🏠宿舍电量通报🏠";
pub const ROUTINE_SUFFIX: &str = "当前电量充足，请保持关注。";

/// 路由结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// 电量不足，全部渠道
    Alert,
    /// 日常通报，仅主渠道
    Routine,
}

/// 路由结果及各渠道发送情况
#[derive(Debug, Clone, PartialEq)]
pub struct RouteReport {
    pub decision: RouteDecision,
    pub outcomes: Vec<ChannelOutcome>,
}

impl RouteReport {
    pub fn delivered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }
}

pub struct NotificationRouter {
    thresholds: Thresholds,
    formatter: ReportFormatter,
    engine: DispatchEngine,
}

impl NotificationRouter {
    pub fn new(thresholds: Thresholds, engine: DispatchEngine) -> Self {
        Self {
            thresholds,
            formatter: ReportFormatter::new(thresholds),
            engine,
        }
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// 判定路径并生成消息（不发送）
    pub fn compose(&self, light: f64, ac: f64) -> (RouteDecision, Notice) {
        let (decision, title, suffix) = if self.thresholds.is_low_energy(light, ac) {
            (RouteDecision::Alert, ALERT_TITLE, ALERT_SUFFIX)
        } else {
            (RouteDecision::Routine, ROUTINE_TITLE, ROUTINE_SUFFIX)
        };

        let body = format!("{}{}", self.formatter.format(light, ac, false), suffix);
        let markup_body = format!("{}{}", self.formatter.format(light, ac, true), suffix);
        (decision, Notice::new(title, body, markup_body))
    }

    /// 路由并发送
    pub fn route(&self, reading: &BalanceReading) -> RouteReport {
        let (decision, notice) = self.compose(reading.light(), reading.ac());
        let outcomes = match decision {
            RouteDecision::Alert => self.engine.dispatch_all(&notice),
            RouteDecision::Routine => self.engine.dispatch_primary(&notice),
        };

        let report = RouteReport { decision, outcomes };
        info!(
            decision = ?report.decision,
            delivered = report.delivered_count(),
            failed = report.failed_count(),
            "Notification routed"
        );
        report
    }
}
