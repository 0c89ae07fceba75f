//! 电量状态分级
//!
//! 根据两个阈值把余额映射为三档：
//! - Sufficient: 余额 > 充足阈值
//! - Low: 低电量阈值 < 余额 <= 充足阈值
//! - Critical: 余额 <= 低电量阈值（触发预警）

use serde::{Deserialize, Serialize};

/// 默认低电量阈值（度）
pub const DEFAULT_THRESHOLD: f64 = 10.0;

/// 默认充足电量阈值（度）
pub const DEFAULT_EXCELLENT_THRESHOLD: f64 = 100.0;

/// 电量状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusTier {
    Sufficient,
    Low,
    Critical,
}

impl std::fmt::Display for StatusTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl StatusTier {
    /// 报告中使用的中文标签
    pub fn label(&self) -> &'static str {
        match self {
            StatusTier::Sufficient => "充足",
            StatusTier::Low => "偏低",
            StatusTier::Critical => "不足",
        }
    }
}

/// 分级阈值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// 低电量阈值，余额小于等于它即为 Critical
    pub threshold: f64,
    /// 充足阈值，余额大于它即为 Sufficient
    pub excellent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            excellent: DEFAULT_EXCELLENT_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn new(threshold: f64, excellent: f64) -> Self {
        Self { threshold, excellent }
    }

    /// 对单个余额分级
    pub fn classify(&self, balance: f64) -> StatusTier {
        if balance > self.excellent {
            StatusTier::Sufficient
        } else if balance > self.threshold {
            StatusTier::Low
        } else {
            StatusTier::Critical
        }
    }

    /// 任一回路处于 Critical 即视为低电量
    pub fn is_low_energy(&self, light: f64, ac: f64) -> bool {
        self.classify(light) == StatusTier::Critical || self.classify(ac) == StatusTier::Critical
    }
}
