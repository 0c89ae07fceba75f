//! Energy Monitor - 宿舍电量监控
//!
//! 获取照明与空调两路剩余电量，按月记录并维护最近 30 条窗口，
//! 通过多个通知渠道发出报警或日常通报。

pub mod config;
pub mod error;
pub mod monitor;
pub mod notification;
pub mod report;
pub mod retry;
pub mod source;
pub mod status;
pub mod storage;

pub use config::{AppConfig, ChannelsConfig};
pub use error::{ChannelError, ConfigError, CryptoError, MonitorError, StorageError};
pub use monitor::{EnergyMonitor, RunSummary};
pub use notification::{
    ChannelOutcome, ChannelRegistry, ChannelSender, DispatchEngine, DispatchResult, Notice,
    NotificationRouter, RouteDecision, SendResult,
};
pub use report::ReportFormatter;
pub use retry::{RetryExecutor, RetryPolicy, Sleeper, WaitRule};
pub use source::{BalanceSource, Balances, CommandBalanceSource, TokenCache};
pub use status::{StatusTier, Thresholds};
pub use storage::{BalanceReading, ReadingRecord, TimeSeriesStore, WindowIndex};
