//! 电量来源与凭据缓存

pub mod command;
pub mod crypto;
pub mod token;

pub use command::CommandBalanceSource;
pub use token::{SavedTokens, TokenCache, TOKEN_ENC_FILE, TOKEN_FILE};

use anyhow::Result;

/// 两个回路的剩余电量（度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balances {
    pub light: f64,
    pub ac: f64,
}

/// 电量来源
pub trait BalanceSource {
    /// 获取一次读数，失败时由调用方按策略重试
    fn fetch(&self) -> Result<Balances>;
}
