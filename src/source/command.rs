//! 通过外部命令获取电量
//!
//! 命令经 `sh -c` 执行，环境中带上账号、房间号以及缓存的 token：
//! `ACCOUNT` `PASSWORD` `LIGHT_ROOM` `AC_ROOM`
//! `ENERGY_USER_TOKEN` `ENERGY_REFRESH_TOKEN`（有缓存时）。
//! 标准输出须为 JSON：
//! `{"light_Balance": 12.5, "ac_Balance": 80.0, "user_token": "...", "refresh_token": "..."}`，
//! 其中 token 字段可省略；返回新 token 时写回缓存。

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::process::Command;
use tracing::{debug, error, info};

use super::token::TokenCache;
use super::{BalanceSource, Balances};
use crate::config::AppConfig;

#[derive(Debug, Deserialize)]
struct CommandOutput {
    #[serde(rename = "light_Balance")]
    light_balance: f64,
    #[serde(rename = "ac_Balance")]
    ac_balance: f64,
    #[serde(default)]
    user_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// 命令行电量来源
#[derive(Clone)]
pub struct CommandBalanceSource {
    command: String,
    env: Vec<(&'static str, String)>,
    tokens: TokenCache,
}

impl CommandBalanceSource {
    pub fn new(command: impl Into<String>, tokens: TokenCache) -> Self {
        Self {
            command: command.into(),
            env: Vec::new(),
            tokens,
        }
    }

    /// 从配置构建，导出账号与房间变量
    pub fn from_config(command: impl Into<String>, config: &AppConfig) -> Self {
        let tokens = TokenCache::in_dir(&config.data_dir, config.timezone);
        let mut source = Self::new(command, tokens);
        source.env = vec![
            ("ACCOUNT", config.account.clone()),
            ("PASSWORD", config.password.clone()),
            ("LIGHT_ROOM", config.light_room.clone()),
            ("AC_ROOM", config.ac_room.clone()),
        ];
        source
    }

    fn remember_tokens(&self, output: &CommandOutput) {
        let (Some(user), Some(refresh)) = (&output.user_token, &output.refresh_token) else {
            return;
        };
        if user.is_empty() || refresh.is_empty() {
            return;
        }
        let unchanged = self
            .tokens
            .load()
            .map(|t| &t.user_token == user && &t.refresh_token == refresh)
            .unwrap_or(false);
        if unchanged {
            return;
        }
        if let Err(e) = self.tokens.save(user, refresh) {
            error!(error = %e, "Failed to save tokens");
        }
    }
}

impl BalanceSource for CommandBalanceSource {
    fn fetch(&self) -> Result<Balances> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.command);
        for (name, value) in &self.env {
            cmd.env(name, value);
        }
        if let Some(tokens) = self.tokens.load() {
            debug!("Passing cached tokens to balance command");
            cmd.env("ENERGY_USER_TOKEN", &tokens.user_token)
                .env("ENERGY_REFRESH_TOKEN", &tokens.refresh_token);
        }

        let output = cmd
            .output()
            .with_context(|| format!("Cannot run balance command: {}", self.command))?;
        if !output.status.success() {
            bail!(
                "Balance command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: CommandOutput = serde_json::from_str(stdout.trim())
            .with_context(|| format!("Balance command printed invalid JSON: {}", stdout.trim()))?;

        self.remember_tokens(&parsed);
        info!(
            light = parsed.light_balance,
            ac = parsed.ac_balance,
            "Balance fetched"
        );
        Ok(Balances {
            light: parsed.light_balance,
            ac: parsed.ac_balance,
        })
    }
}
