//! 具体渠道实现

pub mod aibotk;
pub mod bark;
pub mod chronocat;
pub mod dingtalk;
pub mod email;
pub mod feishu;
pub mod gocqhttp;
pub mod gotify;
pub mod igot;
pub mod ntfy;
pub mod pushdeer;
pub mod pushme;
pub mod pushplus;
pub mod qmsg;
pub mod serverchan;
pub mod synology_chat;
pub mod telegram;
pub mod webhook;
pub mod wecom;

pub use aibotk::{AibotkChannel, AibotkConfig};
pub use bark::{BarkChannel, BarkConfig};
pub use chronocat::{ChronocatChannel, ChronocatConfig};
pub use dingtalk::{DingTalkChannel, DingTalkConfig};
pub use email::{EmailChannel, EmailConfig};
pub use feishu::{FeishuChannel, FeishuConfig};
pub use gocqhttp::{GoCqhttpChannel, GoCqhttpConfig};
pub use gotify::{GotifyChannel, GotifyConfig};
pub use igot::{IgotChannel, IgotConfig};
pub use ntfy::{NtfyChannel, NtfyConfig};
pub use pushdeer::{PushDeerChannel, PushDeerConfig};
pub use pushme::{PushMeChannel, PushMeConfig};
pub use pushplus::{PushPlusChannel, PushPlusConfig};
pub use qmsg::{QmsgChannel, QmsgConfig};
pub use serverchan::{ServerChanChannel, ServerChanConfig};
pub use synology_chat::{SynologyChatChannel, SynologyChatConfig};
pub use telegram::{TelegramChannel, TelegramConfig};
pub use webhook::{WebhookChannel, WebhookConfig, WebhookMethod};
pub use wecom::{WeComChannel, WeComConfig};
