//! 数据目录咨询锁，避免两次运行交错写入同一分区

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StorageError;

const LOCK_FILE: &str = ".lock";

/// 持有期间独占数据目录，Drop 时释放
#[derive(Debug)]
pub struct StorageLock {
    file: File,
    path: PathBuf,
}

impl StorageLock {
    /// 阻塞直到获得锁，必要时创建数据目录
    pub fn acquire(root: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(root).map_err(|e| StorageError::io(root, e))?;
        let path = root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        file.lock_exclusive().map_err(|e| StorageError::io(&path, e))?;
        debug!(path = %path.display(), "Storage lock acquired");
        Ok(Self { file, path })
    }
}

impl Drop for StorageLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!(path = %self.path.display(), error = %e, "Failed to release storage lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_is_exclusive_and_released() {
        let dir = tempdir().unwrap();
        let lock = StorageLock::acquire(dir.path()).unwrap();

        let other = File::open(dir.path().join(LOCK_FILE)).unwrap();
        assert!(other.try_lock_exclusive().is_err());

        drop(lock);
        assert!(other.try_lock_exclusive().is_ok());
        other.unlock().unwrap();
    }

    #[test]
    fn test_acquire_creates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("page").join("data");
        let _lock = StorageLock::acquire(&root).unwrap();
        assert!(root.is_dir());
    }
}
