//! 错误类型

use std::path::PathBuf;
use thiserror::Error;

/// 渠道发送错误，均按同一策略重试
#[derive(Debug, Error)]
pub enum ChannelError {
    /// 网络、超时、连接失败或响应体无法读取
    #[error("transport error: {0}")]
    Transport(String),
    /// 远端服务返回了结构正确但表示拒绝的响应
    #[error("rejected by service: {0}")]
    Protocol(String),
    /// 本地无法构造请求体
    #[error("invalid payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for ChannelError {
    fn from(e: reqwest::Error) -> Self {
        ChannelError::Transport(e.to_string())
    }
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 存储根目录不存在，属于致命配置错误
    #[error("data directory does not exist: {}", .0.display())]
    RootMissing(PathBuf),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error on {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    /// 是否应中止本次运行
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::RootMissing(_))
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// 运行级错误
#[derive(Debug, Error)]
pub enum MonitorError {
    /// 获取电量在重试耗尽后仍然失败
    #[error("balance source unavailable: {0}")]
    SourceUnavailable(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// 凭据加解密错误
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid base64 data: {0}")]
    Encoding(#[from] base64::DecodeError),
    /// 数据过短或认证标签校验失败（多为密码错误）
    #[error("decryption failed: wrong password or corrupted data")]
    Decrypt,
    #[error("encryption failed")]
    Encrypt,
}
