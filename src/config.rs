//! 运行配置
//!
//! 启动时从环境变量一次性构建 [`AppConfig`]，之后只读。
//! 空白值与未设置等价。

use chrono_tz::Tz;
use std::path::PathBuf;
use tracing::debug;

use crate::error::ConfigError;
use crate::notification::channels::bark::DEFAULT_BARK_URL;
use crate::notification::channels::ntfy::DEFAULT_NTFY_URL;
use crate::notification::channels::{
    AibotkConfig, BarkConfig, ChronocatConfig, DingTalkConfig, EmailConfig, FeishuConfig,
    GoCqhttpConfig, GotifyConfig, IgotConfig, NtfyConfig, PushDeerConfig, PushMeConfig,
    PushPlusConfig, QmsgConfig, ServerChanConfig, SynologyChatConfig, TelegramConfig,
    WeComConfig, WebhookConfig,
};
use crate::status::{Thresholds, DEFAULT_EXCELLENT_THRESHOLD, DEFAULT_THRESHOLD};

/// 默认数据目录
pub const DEFAULT_DATA_DIR: &str = "./page/data";

/// 默认时区
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Shanghai;

/// 必填变量
const REQUIRED: [&str; 4] = ["ACCOUNT", "PASSWORD", "LIGHT_ROOM", "AC_ROOM"];

/// 应用配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub account: String,
    pub password: String,
    pub light_room: String,
    pub ac_room: String,
    pub data_dir: PathBuf,
    pub timezone: Tz,
    pub thresholds: Thresholds,
    /// 获取电量的外部命令
    pub balance_command: Option<String>,
    pub channels: ChannelsConfig,
}

/// 各渠道配置，`None` 表示该渠道未配置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelsConfig {
    pub telegram: Option<TelegramConfig>,
    pub serverchan: Option<ServerChanConfig>,
    pub email: Option<EmailConfig>,
    pub bark: Option<BarkConfig>,
    pub dingtalk: Option<DingTalkConfig>,
    pub feishu: Option<FeishuConfig>,
    pub gocqhttp: Option<GoCqhttpConfig>,
    pub gotify: Option<GotifyConfig>,
    pub igot: Option<IgotConfig>,
    pub pushdeer: Option<PushDeerConfig>,
    pub synology_chat: Option<SynologyChatConfig>,
    pub pushplus: Option<PushPlusConfig>,
    pub wecom: Option<WeComConfig>,
    pub qmsg: Option<QmsgConfig>,
    pub aibotk: Option<AibotkConfig>,
    pub pushme: Option<PushMeConfig>,
    pub chronocat: Option<ChronocatConfig>,
    pub ntfy: Option<NtfyConfig>,
    pub webhook: Option<WebhookConfig>,
}

/// 环境变量读取器，统一处理空白值
struct Env<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> Env<'a> {
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_f64(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ConfigError::Invalid {
                    name: name.to_string(),
                    reason: format!("'{}' is not a number", raw),
                }),
        }
    }
}

impl AppConfig {
    /// 读取 `.env`（若存在）后从进程环境构建
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意查找函数构建，测试时可注入 map
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup: &lookup };

        let missing: Vec<String> = REQUIRED
            .iter()
            .filter(|name| env.get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingRequired(missing));
        }
        let required = |name: &str| env.get(name).unwrap_or_default();

        let timezone = match env.get("TIMEZONE") {
            None => DEFAULT_TIMEZONE,
            Some(raw) => raw.parse::<Tz>().map_err(|e| ConfigError::Invalid {
                name: "TIMEZONE".to_string(),
                reason: e.to_string(),
            })?,
        };

        let thresholds = Thresholds::new(
            env.get_f64("THRESHOLD", DEFAULT_THRESHOLD)?,
            env.get_f64("EXCELLENT_THRESHOLD", DEFAULT_EXCELLENT_THRESHOLD)?,
        );

        Ok(Self {
            account: required("ACCOUNT"),
            password: required("PASSWORD"),
            light_room: required("LIGHT_ROOM"),
            ac_room: required("AC_ROOM"),
            data_dir: data_dir_from(&env),
            timezone,
            thresholds,
            balance_command: env.get("BALANCE_COMMAND"),
            channels: ChannelsConfig::from_env(&env)?,
        })
    }
}

/// 仅解析数据目录（`rebuild` 子命令不需要账号信息）
pub fn data_dir_from_lookup<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    data_dir_from(&Env { lookup: &lookup })
}

fn data_dir_from(env: &Env<'_>) -> PathBuf {
    PathBuf::from(env.get("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()))
}

impl ChannelsConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let webhook = match env.get("WEBHOOK_URL") {
            Some(url) => Some(WebhookConfig::parse(
                url,
                env.get("WEBHOOK_METHOD").as_deref(),
                env.get("WEBHOOK_HEADERS").as_deref(),
                env.get("WEBHOOK_BODY_TEMPLATE"),
            )?),
            None => None,
        };

        Ok(Self {
            telegram: both(env, "TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID")
                .map(|(bot_token, chat_id)| TelegramConfig { bot_token, chat_id }),
            serverchan: env
                .get("SERVERCHAN_KEYS")
                .and_then(|raw| ServerChanConfig::parse(&raw)),
            email: match (env.get("EMAIL"), env.get("SMTP_CODE"), env.get("SMTP_SERVER")) {
                (Some(address), Some(smtp_code), Some(smtp_server)) => Some(EmailConfig {
                    address,
                    smtp_code,
                    smtp_server,
                }),
                _ => None,
            },
            bark: env.get("BARK_KEY").map(|key| BarkConfig {
                server: env
                    .get("BARK_URL")
                    .unwrap_or_else(|| DEFAULT_BARK_URL.to_string()),
                key,
            }),
            dingtalk: env.get("DINGTALK_WEBHOOK").map(|webhook| DingTalkConfig {
                webhook,
                secret: env.get("DINGTALK_SECRET"),
            }),
            feishu: env.get("FEISHU_WEBHOOK").map(|webhook| FeishuConfig {
                webhook,
                secret: env.get("FEISHU_SECRET"),
            }),
            gocqhttp: both(env, "GOCQHTTP_URL", "GOCQHTTP_TARGET").map(|(url, target)| {
                GoCqhttpConfig {
                    url,
                    target,
                    token: env.get("GOCQHTTP_TOKEN"),
                }
            }),
            gotify: both(env, "GOTIFY_URL", "GOTIFY_TOKEN")
                .map(|(url, token)| GotifyConfig { url, token }),
            igot: env.get("IGOT_KEY").map(|key| IgotConfig { key }),
            pushdeer: env.get("PUSHDEER_KEY").map(|key| PushDeerConfig { key }),
            synology_chat: both(env, "SYNOLOGY_CHAT_URL", "SYNOLOGY_CHAT_TOKEN")
                .map(|(url, token)| SynologyChatConfig { url, token }),
            pushplus: env.get("PUSHPLUS_TOKEN").map(|token| PushPlusConfig { token }),
            wecom: match (
                env.get("WECOM_CORP_ID"),
                env.get("WECOM_AGENT_ID"),
                env.get("WECOM_SECRET"),
            ) {
                (Some(corp_id), Some(agent_id), Some(secret)) => Some(WeComConfig {
                    corp_id,
                    agent_id,
                    secret,
                    to_user: env.get("WECOM_TOUSER").unwrap_or_else(|| "@all".to_string()),
                }),
                _ => None,
            },
            qmsg: env.get("QMSG_KEY").map(|key| QmsgConfig {
                key,
                qq: env.get("QMSG_QQ"),
            }),
            aibotk: both(env, "AIBOTK_KEY", "AIBOTK_TARGET")
                .map(|(key, target)| AibotkConfig { key, target }),
            pushme: env.get("PUSHME_KEY").map(|key| PushMeConfig { key }),
            chronocat: both(env, "CHRONOCAT_URL", "CHRONOCAT_TARGET").map(|(url, target)| {
                ChronocatConfig {
                    url,
                    target,
                    token: env.get("CHRONOCAT_TOKEN"),
                }
            }),
            ntfy: env.get("NTFY_TOPIC").map(|topic| NtfyConfig {
                server: env
                    .get("NTFY_URL")
                    .unwrap_or_else(|| DEFAULT_NTFY_URL.to_string()),
                topic,
                token: env.get("NTFY_TOKEN"),
            }),
            webhook,
        })
    }

    /// 已配置的渠道名称
    pub fn configured_names(&self) -> Vec<&'static str> {
        let flags = [
            ("telegram", self.telegram.is_some()),
            ("serverchan", self.serverchan.is_some()),
            ("email", self.email.is_some()),
            ("bark", self.bark.is_some()),
            ("dingtalk", self.dingtalk.is_some()),
            ("feishu", self.feishu.is_some()),
            ("gocqhttp", self.gocqhttp.is_some()),
            ("gotify", self.gotify.is_some()),
            ("igot", self.igot.is_some()),
            ("pushdeer", self.pushdeer.is_some()),
            ("synology_chat", self.synology_chat.is_some()),
            ("pushplus", self.pushplus.is_some()),
            ("wecom", self.wecom.is_some()),
            ("qmsg", self.qmsg.is_some()),
            ("aibotk", self.aibotk.is_some()),
            ("pushme", self.pushme.is_some()),
            ("chronocat", self.chronocat.is_some()),
            ("ntfy", self.ntfy.is_some()),
            ("webhook", self.webhook.is_some()),
        ];
        flags
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| *name)
            .collect()
    }
}

fn both(env: &Env<'_>, a: &str, b: &str) -> Option<(String, String)> {
    Some((env.get(a)?, env.get(b)?))
}
