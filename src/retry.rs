//! 重试策略与执行器
//!
//! 策略是纯数据（最大尝试次数 + 等待规则链），执行器负责按策略重复调用操作。
//! 等待通过 [`Sleeper`] 完成，测试中可替换为记录型实现，不产生真实延迟。

use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// 单条等待规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitRule {
    /// 固定等待
    Fixed(Duration),
    /// 指数等待：`multiplier * 2^(attempt-1)` 秒，限制在 `[min, max]` 内
    ///
    /// `min > max` 时两端互换后再限制。
    Exponential {
        multiplier: u64,
        min: Duration,
        max: Duration,
    },
}

impl WaitRule {
    /// `attempt` 为已完成的尝试次数（从 1 开始）
    pub fn wait_for(&self, attempt: u32) -> Duration {
        match *self {
            WaitRule::Fixed(d) => d,
            WaitRule::Exponential { multiplier, min, max } => {
                let exp = 2u64.saturating_pow(attempt.saturating_sub(1));
                let secs = multiplier.saturating_mul(exp);
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                Duration::from_secs(secs).clamp(lo, hi)
            }
        }
    }
}

/// 重试策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（包含第一次）
    pub max_attempts: u32,
    /// 等待规则链，按重试序号取用，用尽后重复最后一条
    pub wait_schedule: Vec<WaitRule>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, wait_schedule: Vec<WaitRule>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait_schedule,
        }
    }

    /// 获取电量：纯指数等待，15s 起，上限 120s，共 5 次
    pub fn balance_fetch() -> Self {
        Self::new(
            5,
            vec![WaitRule::Exponential {
                multiplier: 1,
                min: Duration::from_secs(15),
                max: Duration::from_secs(120),
            }],
        )
    }

    /// 渠道发送：15s → 30s → 指数（45s ~ 120s），共 5 次
    pub fn channel_send() -> Self {
        Self::new(
            5,
            vec![
                WaitRule::Fixed(Duration::from_secs(15)),
                WaitRule::Fixed(Duration::from_secs(30)),
                WaitRule::Exponential {
                    multiplier: 1,
                    min: Duration::from_secs(45),
                    max: Duration::from_secs(120),
                },
            ],
        )
    }

    /// 第 `attempt` 次尝试失败后的等待时长
    pub fn wait_for(&self, attempt: u32) -> Duration {
        if self.wait_schedule.is_empty() {
            return Duration::ZERO;
        }
        let idx = (attempt.max(1) as usize - 1).min(self.wait_schedule.len() - 1);
        self.wait_schedule[idx].wait_for(attempt)
    }

    /// 最坏情况下的总等待时长（不含请求本身耗时）
    pub fn total_wait(&self) -> Duration {
        (1..self.max_attempts).map(|i| self.wait_for(i)).sum()
    }
}

/// 重试耗尽，保留最后一次错误
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted<E: std::fmt::Display + std::fmt::Debug> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: std::fmt::Display + std::fmt::Debug> RetryExhausted<E> {
    pub fn into_inner(self) -> E {
        self.last_error
    }
}

/// 等待抽象
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// 真实阻塞等待
#[derive(Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// 只记录等待时长，不真正等待
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

/// 重试执行器
#[derive(Clone)]
pub struct RetryExecutor {
    sleeper: Arc<dyn Sleeper>,
}

impl RetryExecutor {
    pub fn new(sleeper: Arc<dyn Sleeper>) -> Self {
        Self { sleeper }
    }

    /// 按策略执行操作，所有错误一视同仁地重试
    ///
    /// 操作收到当前尝试序号（从 1 开始）。最后一次失败后不再等待。
    pub fn execute<T, E, F>(
        &self,
        label: &str,
        policy: &RetryPolicy,
        mut operation: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        E: std::fmt::Display + std::fmt::Debug,
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(target_name = %label, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= policy.max_attempts => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    let wait = policy.wait_for(attempt);
                    warn!(
                        target_name = %label,
                        attempt,
                        max_attempts = policy.max_attempts,
                        wait_secs = wait.as_secs_f64(),
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    self.sleeper.sleep(wait);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(Arc::new(ThreadSleeper))
    }
}
