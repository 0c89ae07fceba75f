//! 单次运行端到端测试（假电量来源 + 假渠道 + 临时目录）

use anyhow::anyhow;
use chrono::NaiveDateTime;
use energy_monitor::error::ChannelError;
use energy_monitor::notification::{
    ChannelRegistry, ChannelSender, DispatchEngine, NotificationRouter, RouteDecision, SendResult,
};
use energy_monitor::retry::{RecordingSleeper, RetryExecutor, RetryPolicy};
use energy_monitor::source::{BalanceSource, Balances};
use energy_monitor::storage::{LAST_RECORDS_FILE, TIME_FILE};
use energy_monitor::{EnergyMonitor, MonitorError, Thresholds};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

struct FixedSource(Option<Balances>);

impl BalanceSource for FixedSource {
    fn fetch(&self) -> anyhow::Result<Balances> {
        self.0.ok_or_else(|| anyhow!("CAS login failed"))
    }
}

#[derive(Default)]
struct CountingChannel {
    sends: AtomicUsize,
}

impl ChannelSender for CountingChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn send(&self, _title: &str, _body: &str) -> Result<SendResult, ChannelError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        Ok(SendResult::Delivered)
    }
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn build(
    root: &std::path::Path,
    balances: Option<Balances>,
) -> (EnergyMonitor, Arc<CountingChannel>, Arc<RecordingSleeper>) {
    let channel = Arc::new(CountingChannel::default());
    let sleeper = Arc::new(RecordingSleeper::new());
    let engine = DispatchEngine::new(ChannelRegistry::new().with_primary(channel.clone()))
        .with_executor(RetryExecutor::new(sleeper.clone()));
    let monitor = EnergyMonitor::new(
        Box::new(FixedSource(balances)),
        NotificationRouter::new(Thresholds::default(), engine),
        root,
    )
    .with_executor(RetryExecutor::new(sleeper.clone()));
    (monitor, channel, sleeper)
}

#[test]
fn test_full_run_notifies_and_records() {
    let dir = tempdir().unwrap();
    let (monitor, channel, _) = build(dir.path(), Some(Balances { light: 8.0, ac: 200.0 }));

    let summary = monitor.run_at(at("2024-06-15 08:30:00")).unwrap();
    assert_eq!(summary.route.decision, RouteDecision::Alert);
    assert_eq!(channel.sends.load(Ordering::SeqCst), 1);
    assert_eq!(summary.partition_len, Some(1));

    assert!(dir.path().join("2024-06.json").exists());
    assert!(dir.path().join(TIME_FILE).exists());
    let window = fs::read_to_string(dir.path().join(LAST_RECORDS_FILE)).unwrap();
    assert!(window.contains("\"time\": \"06-15 08:30:00\""));
    assert!(window.contains("\"light_Balance\": 8.0"));
}

#[test]
fn test_runs_across_month_boundary_fill_window() {
    let dir = tempdir().unwrap();
    let (monitor, _, _) = build(dir.path(), Some(Balances { light: 50.0, ac: 200.0 }));

    monitor.run_at(at("2024-05-31 20:00:00")).unwrap();
    let summary = monitor.run_at(at("2024-06-01 08:00:00")).unwrap();

    let window = summary.window.unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window.records()[0].time, "05-31 20:00:00");
    assert_eq!(window.records()[1].time, "06-01 08:00:00");
}

#[test]
fn test_exhausted_source_aborts_before_notify_and_store() {
    let dir = tempdir().unwrap();
    let (monitor, channel, sleeper) = build(dir.path(), None);

    let err = monitor.run_at(at("2024-06-15 08:30:00")).unwrap_err();
    assert!(matches!(err, MonitorError::SourceUnavailable(ref m) if m.contains("CAS login failed")));
    assert_eq!(channel.sends.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join(TIME_FILE).exists());

    // 默认获取策略：5 次尝试，指数等待被下限夹到 15s
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(15); 4]);
    assert_eq!(RetryPolicy::balance_fetch().total_wait(), Duration::from_secs(60));
}
