//! 通知层 - 统一管理所有通知渠道
//!
//! 1. 统一接口：所有渠道实现 `ChannelSender` trait
//! 2. 渠道解耦：每个渠道独立实现，互不影响，单个失败不会中断其他渠道
//! 3. 分级路由：`NotificationRouter` 根据电量决定发到全部渠道还是仅主渠道
//!
//! # 使用示例
//! ```ignore
//! use energy_monitor::notification::{ChannelRegistry, DispatchEngine, NotificationRouter};
//!
//! let registry = ChannelRegistry::from_config(&config.channels, build_client()?);
//! let router = NotificationRouter::new(config.thresholds, DispatchEngine::new(registry));
//! let report = router.route(&reading);
//! ```

pub mod channel;
pub mod channels;
pub mod dispatcher;
pub mod http;
pub mod registry;
pub mod router;

pub use channel::{ChannelOutcome, ChannelSender, DispatchResult, Notice, SendResult};
pub use dispatcher::DispatchEngine;
pub use http::build_client;
pub use registry::ChannelRegistry;
pub use router::{NotificationRouter, RouteDecision, RouteReport};
