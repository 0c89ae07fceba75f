//! 电量时间序列存储
//!
//! 数据目录布局：
//! - `YYYY-MM.json`：当月全部读数，只追加
//! - `time.json`：现有月份列表，倒序
//! - `last_30_records.json`：最近 30 条读数，正序
//!
//! 所有文件均为 UTF-8、两空格缩进的 JSON，非 ASCII 字符原样保留。

pub mod lock;
pub mod record;
pub mod series;
pub mod window;

pub use lock::StorageLock;
pub use record::{BalanceReading, PartitionKey, ReadingRecord, RECORD_TIME_FORMAT};
pub use series::TimeSeriesStore;
pub use window::{PartitionIndex, RollingWindow, WindowIndex, WINDOW_SIZE};

use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::StorageError;

/// 月份索引文件
pub const TIME_FILE: &str = "time.json";
/// 滚动窗口文件
pub const LAST_RECORDS_FILE: &str = "last_30_records.json";

/// 读取一个分区文件，缺失或损坏时按空处理
pub(crate) fn load_records(path: &Path) -> Vec<ReadingRecord> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read partition, treating as empty");
            return Vec::new();
        }
    };
    match serde_json::from_str(&content) {
        Ok(records) => records,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt partition, treating as empty");
            Vec::new()
        }
    }
}

/// 整文件覆盖写入
pub(crate) fn save_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
    }
    let content = serde_json::to_string_pretty(data).map_err(|e| StorageError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, content).map_err(|e| StorageError::io(path, e))?;
    info!(path = %path.display(), "Data saved");
    Ok(())
}
