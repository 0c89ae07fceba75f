//! 登录 token 缓存 (`tokens.json`)

use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::StorageError;
use crate::storage::save_json;

pub const TOKEN_FILE: &str = "tokens.json";
pub const TOKEN_ENC_FILE: &str = "tokens.enc";

/// 缓存的 token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTokens {
    pub user_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

/// token 缓存文件
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
    timezone: Tz,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            path: path.into(),
            timezone,
        }
    }

    /// 数据目录下的 `tokens.json`
    pub fn in_dir(root: &Path, timezone: Tz) -> Self {
        Self::new(root.join(TOKEN_FILE), timezone)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取缓存，文件缺失、损坏或 token 为空时返回 None
    pub fn load(&self) -> Option<SavedTokens> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => {
                info!("Token file not found, the source will log in with account credentials");
                return None;
            }
        };
        match serde_json::from_str::<SavedTokens>(&content) {
            Ok(tokens) if !tokens.user_token.is_empty() && !tokens.refresh_token.is_empty() => {
                info!(
                    saved_at = tokens.saved_at.as_deref().unwrap_or("unknown"),
                    "Tokens loaded"
                );
                Some(tokens)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot parse token file");
                None
            }
        }
    }

    /// 保存 token，记录保存时间（配置时区）
    pub fn save(&self, user_token: &str, refresh_token: &str) -> Result<SavedTokens, StorageError> {
        let tokens = SavedTokens {
            user_token: user_token.to_string(),
            refresh_token: refresh_token.to_string(),
            saved_at: Some(
                Utc::now()
                    .with_timezone(&self.timezone)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
        };
        save_json(&self.path, &tokens)?;
        info!(path = %self.path.display(), "Tokens saved");
        Ok(tokens)
    }
}
