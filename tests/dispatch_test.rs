//! 分发与路由集成测试，使用假渠道，不走网络

use chrono::NaiveDateTime;
use energy_monitor::error::ChannelError;
use energy_monitor::notification::{
    ChannelRegistry, ChannelSender, DispatchEngine, DispatchResult, NotificationRouter,
    RouteDecision, SendResult,
};
use energy_monitor::retry::{RecordingSleeper, RetryExecutor, RetryPolicy, WaitRule};
use energy_monitor::storage::BalanceReading;
use energy_monitor::Thresholds;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FakeChannel {
    name: &'static str,
    always_fail: bool,
    calls: AtomicUsize,
    titles: Mutex<Vec<String>>,
}

impl FakeChannel {
    fn new(name: &'static str, always_fail: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            always_fail,
            calls: AtomicUsize::new(0),
            titles: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChannelSender for FakeChannel {
    fn name(&self) -> &str {
        self.name
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn send(&self, title: &str, _body: &str) -> Result<SendResult, ChannelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.titles.lock().unwrap().push(title.to_string());
        if self.always_fail {
            Err(ChannelError::Protocol("code=500 (server busy)".to_string()))
        } else {
            Ok(SendResult::Delivered)
        }
    }
}

fn fast_engine(registry: ChannelRegistry) -> (DispatchEngine, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::new());
    let engine = DispatchEngine::new(registry)
        .with_executor(RetryExecutor::new(sleeper.clone()))
        .with_policy(RetryPolicy::new(
            3,
            vec![
                WaitRule::Fixed(Duration::from_secs(1)),
                WaitRule::Fixed(Duration::from_secs(2)),
            ],
        ));
    (engine, sleeper)
}

fn reading(light: f64, ac: f64) -> BalanceReading {
    let at = NaiveDateTime::parse_from_str("2024-06-15 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
    BalanceReading::new(at, light, ac)
}

#[test]
fn test_failing_middle_channel_does_not_block_others() {
    let first = FakeChannel::new("first", false);
    let broken = FakeChannel::new("broken", true);
    let third = FakeChannel::new("third", false);

    let mut registry = ChannelRegistry::new();
    registry.register_alert(first.clone());
    registry.register_alert(broken.clone());
    registry.register_alert(third.clone());
    let (engine, sleeper) = fast_engine(registry);

    let router = NotificationRouter::new(Thresholds::default(), engine);
    let report = router.route(&reading(5.0, 200.0));

    assert_eq!(report.decision, RouteDecision::Alert);
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.outcomes[0].result, DispatchResult::Delivered);
    assert_eq!(
        report.outcomes[1].result,
        DispatchResult::Failed("rejected by service: code=500 (server busy)".to_string())
    );
    assert_eq!(report.outcomes[2].result, DispatchResult::Delivered);

    assert_eq!(first.calls(), 1);
    assert_eq!(broken.calls(), 3);
    assert_eq!(third.calls(), 1);
    assert_eq!(
        sleeper.waits(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[test]
fn test_critical_light_goes_to_every_channel() {
    let primary = FakeChannel::new("telegram", false);
    let alert = FakeChannel::new("bark", false);
    let mut registry = ChannelRegistry::new().with_primary(primary.clone());
    registry.register_alert(alert.clone());
    let (engine, _) = fast_engine(registry);

    let report = NotificationRouter::new(Thresholds::default(), engine).route(&reading(8.0, 200.0));
    assert_eq!(report.decision, RouteDecision::Alert);
    assert_eq!(report.delivered_count(), 2);
    assert_eq!(alert.titles.lock().unwrap()[0], "⚠️宿舍电量预警⚠️");
}

#[test]
fn test_routine_reading_only_uses_primary() {
    let primary = FakeChannel::new("telegram", false);
    let alert = FakeChannel::new("bark", false);
    let mut registry = ChannelRegistry::new().with_primary(primary.clone());
    registry.register_alert(alert.clone());
    let (engine, _) = fast_engine(registry);

    let report = NotificationRouter::new(Thresholds::default(), engine).route(&reading(50.0, 200.0));
    assert_eq!(report.decision, RouteDecision::Routine);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(primary.calls(), 1);
    assert_eq!(alert.calls(), 0);
    assert_eq!(primary.titles.lock().unwrap()[0], "🏠宿舍电量通报🏠");
}

#[test]
fn test_registry_from_empty_config_skips_everything() {
    let registry = ChannelRegistry::from_config(
        &energy_monitor::ChannelsConfig::default(),
        energy_monitor::notification::build_client().unwrap(),
    );
    let (engine, sleeper) = fast_engine(registry);

    let report = NotificationRouter::new(Thresholds::default(), engine).route(&reading(1.0, 1.0));
    assert_eq!(report.outcomes.len(), 19);
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.result == DispatchResult::Skipped("not configured".to_string())));
    assert!(sleeper.waits().is_empty());
}
