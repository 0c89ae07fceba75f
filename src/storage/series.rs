//! 按月分区的追加日志

use std::path::{Path, PathBuf};
use tracing::info;

use super::record::{BalanceReading, PartitionKey, ReadingRecord};
use super::{load_records, save_json};
use crate::error::StorageError;

/// 时间序列存储
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    root: PathBuf,
}

impl TimeSeriesStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn partition_path(&self, key: PartitionKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// 读取分区，缺失或损坏时为空
    pub fn load_partition(&self, key: PartitionKey) -> Vec<ReadingRecord> {
        load_records(&self.partition_path(key))
    }

    /// 追加一条读数到其所属月份，返回该分区的新长度
    ///
    /// 不做去重，同一读数追加两次会得到两条相同记录。
    pub fn append(&self, reading: &BalanceReading) -> Result<usize, StorageError> {
        let key = reading.partition_key();
        let path = self.partition_path(key);

        let mut records = load_records(&path);
        records.push(ReadingRecord::from(reading));
        save_json(&path, &records)?;

        info!(partition = %key, count = records.len(), "Reading appended");
        Ok(records.len())
    }
}
