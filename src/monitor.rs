//! 单次运行流程：获取电量 → 通知 → 记录 → 刷新窗口

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::error::MonitorError;
use crate::notification::{NotificationRouter, RouteReport};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::source::{BalanceSource, Balances};
use crate::storage::{BalanceReading, RollingWindow, StorageLock, TimeSeriesStore, WindowIndex};

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reading: BalanceReading,
    pub route: RouteReport,
    /// 追加后的当月条数，写入失败时为 None
    pub partition_len: Option<usize>,
    pub window: Option<RollingWindow>,
}

/// 电量监控器
pub struct EnergyMonitor {
    source: Box<dyn BalanceSource>,
    router: NotificationRouter,
    data_dir: PathBuf,
    executor: RetryExecutor,
    fetch_policy: RetryPolicy,
}

impl EnergyMonitor {
    pub fn new(
        source: Box<dyn BalanceSource>,
        router: NotificationRouter,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            router,
            data_dir: data_dir.into(),
            executor: RetryExecutor::default(),
            fetch_policy: RetryPolicy::balance_fetch(),
        }
    }

    /// 替换重试执行器（测试注入记录型 sleeper）
    pub fn with_executor(mut self, executor: RetryExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_fetch_policy(mut self, policy: RetryPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 以配置时区运行，读数时间取获取成功的时刻
    pub fn run(&self, timezone: Tz) -> Result<RunSummary, MonitorError> {
        self.run_with_clock(|| Utc::now().with_timezone(&timezone).naive_local())
    }

    /// 以指定本地时间运行
    ///
    /// 获取电量失败或数据目录缺失时返回错误；渠道失败和写入失败只记日志。
    pub fn run_at(&self, now: NaiveDateTime) -> Result<RunSummary, MonitorError> {
        self.run_with_clock(|| now)
    }

    /// `clock` 在获取成功后才调用，重试等待不会把读数记到上一个月
    fn run_with_clock(
        &self,
        clock: impl FnOnce() -> NaiveDateTime,
    ) -> Result<RunSummary, MonitorError> {
        info!("Starting dorm energy check");

        let balances = self.fetch()?;
        info!(light = balances.light, ac = balances.ac, "Balance received");
        let reading = BalanceReading::new(clock(), balances.light, balances.ac);

        let route = self.router.route(&reading);
        let (partition_len, window) = self.persist(&reading)?;

        info!("Run finished");
        Ok(RunSummary {
            reading,
            route,
            partition_len,
            window,
        })
    }

    fn fetch(&self) -> Result<Balances, MonitorError> {
        self.executor
            .execute("balance_source", &self.fetch_policy, |_| self.source.fetch())
            .map_err(|exhausted| {
                error!(
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "Failed to fetch balance"
                );
                MonitorError::SourceUnavailable(format!("{:#}", exhausted.last_error))
            })
    }

    fn persist(
        &self,
        reading: &BalanceReading,
    ) -> Result<(Option<usize>, Option<RollingWindow>), MonitorError> {
        let _lock = match StorageLock::acquire(&self.data_dir) {
            Ok(lock) => Some(lock),
            Err(e) => {
                warn!(error = %e, "Cannot lock data directory, continuing without lock");
                None
            }
        };

        let partition_len = match TimeSeriesStore::new(&self.data_dir).append(reading) {
            Ok(len) => Some(len),
            Err(e) => {
                error!(error = %e, "Failed to record reading");
                None
            }
        };

        let window = match WindowIndex::new(&self.data_dir).refresh() {
            Ok(window) => Some(window),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                error!(error = %e, "Failed to refresh rolling window");
                None
            }
        };

        Ok((partition_len, window))
    }
}
