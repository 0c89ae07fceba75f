//! 月份索引与最近 30 条滚动窗口

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::lock::StorageLock;
use super::record::{PartitionKey, ReadingRecord};
use super::{load_records, save_json, LAST_RECORDS_FILE, TIME_FILE};
use crate::error::StorageError;

/// 滚动窗口容量
pub const WINDOW_SIZE: usize = 30;

/// 现有分区，按月份倒序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionIndex(Vec<PartitionKey>);

impl PartitionIndex {
    pub fn new(mut keys: Vec<PartitionKey>) -> Self {
        keys.sort_unstable_by(|a, b| b.cmp(a));
        keys.dedup();
        Self(keys)
    }

    pub fn keys(&self) -> &[PartitionKey] {
        &self.0
    }

    pub fn newest(&self) -> Option<PartitionKey> {
        self.0.first().copied()
    }

    pub fn previous(&self) -> Option<PartitionKey> {
        self.0.get(1).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 最近的读数，旧的在前
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollingWindow(Vec<ReadingRecord>);

impl RollingWindow {
    pub fn records(&self) -> &[ReadingRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn latest(&self) -> Option<&ReadingRecord> {
        self.0.last()
    }
}

/// 由分区文件重新推导索引与窗口
#[derive(Debug, Clone)]
pub struct WindowIndex {
    root: PathBuf,
}

impl WindowIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 扫描数据目录重建月份索引并写入 `time.json`
    ///
    /// `time.json` 写入失败只记日志，仍返回扫描结果，窗口照常重建。
    pub fn rebuild_index(&self) -> Result<PartitionIndex, StorageError> {
        if !self.root.is_dir() {
            return Err(StorageError::RootMissing(self.root.clone()));
        }

        let entries = fs::read_dir(&self.root).map_err(|e| StorageError::io(&self.root, e))?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&self.root, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            match PartitionKey::from_file_name(name) {
                Some(Ok(key)) => keys.push(key),
                Some(Err(reason)) => {
                    warn!(file = %name, reason = %reason, "Skipping invalid partition file");
                }
                None => {}
            }
        }

        let index = PartitionIndex::new(keys);
        let names: Vec<String> = index.keys().iter().map(|k| k.to_string()).collect();
        match save_json(&self.root.join(TIME_FILE), &names) {
            Ok(()) => info!(partitions = index.len(), "Time list updated"),
            Err(e) => error!(error = %e, "Failed to write time list"),
        }
        Ok(index)
    }

    /// 由最新一个（不足时再加上一个）分区生成最近 30 条，写入 `last_30_records.json`
    pub fn rebuild_window(&self, index: &PartitionIndex) -> Result<RollingWindow, StorageError> {
        let current = match index.newest() {
            Some(key) => load_records(&self.root.join(key.file_name())),
            None => Vec::new(),
        };

        let combined = match index.previous() {
            Some(prev_key) if current.len() < WINDOW_SIZE => {
                let mut previous = load_records(&self.root.join(prev_key.file_name()));
                let need = (WINDOW_SIZE - current.len()).min(previous.len());
                let mut combined = previous.split_off(previous.len() - need);
                combined.extend(current);
                combined
            }
            _ => current,
        };

        let skip = combined.len().saturating_sub(WINDOW_SIZE);
        let window: Vec<ReadingRecord> = combined.into_iter().skip(skip).collect();
        save_json(&self.root.join(LAST_RECORDS_FILE), &window)?;
        info!(count = window.len(), "Rolling window updated");
        Ok(RollingWindow(window))
    }

    /// 先重建索引，再重建窗口
    pub fn refresh(&self) -> Result<RollingWindow, StorageError> {
        let index = self.rebuild_index()?;
        self.rebuild_window(&index)
    }

    /// 持有数据目录锁执行 [`refresh`](Self::refresh)，不会创建缺失的数据目录
    pub fn refresh_locked(&self) -> Result<RollingWindow, StorageError> {
        if !self.root.is_dir() {
            return Err(StorageError::RootMissing(self.root.clone()));
        }
        let _lock = match StorageLock::acquire(&self.root) {
            Ok(lock) => Some(lock),
            Err(e) => {
                warn!(error = %e, "Cannot lock data directory, continuing without lock");
                None
            }
        };
        self.refresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_partition(root: &Path, key: &str, count: usize) {
        let records: Vec<ReadingRecord> = (0..count)
            .map(|i| ReadingRecord {
                time: format!("{} #{}", key, i),
                light_balance: i as f64,
                ac_balance: 0.0,
            })
            .collect();
        save_json(&root.join(format!("{}.json", key)), &records).unwrap();
    }

    #[test]
    fn test_root_missing_is_error() {
        let dir = tempdir().unwrap();
        let index = WindowIndex::new(dir.path().join("absent"));
        let err = index.rebuild_index().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_index_sorted_descending_and_persisted() {
        let dir = tempdir().unwrap();
        write_partition(dir.path(), "2023-12", 1);
        write_partition(dir.path(), "2024-06", 1);
        write_partition(dir.path(), "2024-05", 1);
        fs::write(dir.path().join("2024-13.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let index = WindowIndex::new(dir.path()).rebuild_index().unwrap();
        let names: Vec<String> = index.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["2024-06", "2024-05", "2023-12"]);

        let saved: Vec<String> =
            serde_json::from_str(&fs::read_to_string(dir.path().join(TIME_FILE)).unwrap()).unwrap();
        assert_eq!(saved, names);
    }

    #[test]
    fn test_empty_root_gives_empty_window() {
        let dir = tempdir().unwrap();
        let window = WindowIndex::new(dir.path()).refresh().unwrap();
        assert!(window.is_empty());
        assert!(dir.path().join(LAST_RECORDS_FILE).exists());
    }

    #[test]
    fn test_borrows_only_one_partition_back() {
        let dir = tempdir().unwrap();
        write_partition(dir.path(), "2024-04", 20);
        write_partition(dir.path(), "2024-05", 3);
        write_partition(dir.path(), "2024-06", 2);

        let window = WindowIndex::new(dir.path()).refresh().unwrap();
        assert_eq!(window.len(), 5);
        assert_eq!(window.records()[0].time, "2024-05 #0");
        assert_eq!(window.latest().unwrap().time, "2024-06 #1");
    }

    #[test]
    fn test_previous_partition_tail_fills_window() {
        let dir = tempdir().unwrap();
        write_partition(dir.path(), "2024-05", 50);
        write_partition(dir.path(), "2024-06", 10);

        let window = WindowIndex::new(dir.path()).refresh().unwrap();
        assert_eq!(window.len(), WINDOW_SIZE);
        assert_eq!(window.records()[0].time, "2024-05 #30");
        assert_eq!(window.records()[19].time, "2024-05 #49");
        assert_eq!(window.records()[20].time, "2024-06 #0");
    }

    fn saved_time_list(root: &Path) -> Vec<String> {
        serde_json::from_str(&fs::read_to_string(root.join(TIME_FILE)).unwrap()).unwrap()
    }

    #[test]
    fn test_stale_time_list_is_replaced_from_disk() {
        let dir = tempdir().unwrap();
        write_partition(dir.path(), "2024-05", 2);
        write_partition(dir.path(), "2024-06", 1);
        save_json(&dir.path().join(TIME_FILE), &["2024-07", "2024-06", "2024-05"]).unwrap();

        let window = WindowIndex::new(dir.path()).refresh().unwrap();
        assert_eq!(saved_time_list(dir.path()), vec!["2024-06", "2024-05"]);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_partition_deleted_between_refreshes() {
        let dir = tempdir().unwrap();
        write_partition(dir.path(), "2024-05", 4);
        write_partition(dir.path(), "2024-06", 2);
        let index = WindowIndex::new(dir.path());
        assert_eq!(index.refresh().unwrap().len(), 6);

        fs::remove_file(dir.path().join("2024-06.json")).unwrap();
        let window = index.refresh().unwrap();
        assert_eq!(saved_time_list(dir.path()), vec!["2024-05"]);
        assert_eq!(window.len(), 4);
        assert_eq!(window.latest().unwrap().time, "2024-05 #3");
    }

    #[test]
    fn test_time_list_write_failure_still_rebuilds_window() {
        let dir = tempdir().unwrap();
        write_partition(dir.path(), "2024-06", 3);
        fs::create_dir(dir.path().join(TIME_FILE)).unwrap();

        let window = WindowIndex::new(dir.path()).refresh().unwrap();
        assert_eq!(window.len(), 3);
        let saved: Vec<ReadingRecord> = serde_json::from_str(
            &fs::read_to_string(dir.path().join(LAST_RECORDS_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(saved.len(), 3);
    }

    #[test]
    fn test_refresh_locked_missing_root_not_created() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("absent");
        let err = WindowIndex::new(&root).refresh_locked().unwrap_err();
        assert!(err.is_fatal());
        assert!(!root.exists());
    }

    #[test]
    fn test_refresh_locked_waits_for_holder() {
        let dir = tempdir().unwrap();
        write_partition(dir.path(), "2024-06", 1);
        let held = StorageLock::acquire(dir.path()).unwrap();

        let root = dir.path().to_path_buf();
        let worker = std::thread::spawn(move || WindowIndex::new(root).refresh_locked());
        std::thread::sleep(std::time::Duration::from_millis(200));
        assert!(!dir.path().join(LAST_RECORDS_FILE).exists());

        drop(held);
        let window = worker.join().unwrap().unwrap();
        assert_eq!(window.len(), 1);
        assert!(dir.path().join(LAST_RECORDS_FILE).exists());
    }
}
