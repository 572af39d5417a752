//! Exclusive locks shared by every process that opens the same data
//! directory.
//!
//! Each file store guards its read-modify-write paths with one lock file.
//! The OS lock is held through an open handle and released when the guard
//! drops, including when the process dies.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tokio::sync::{Mutex, MutexGuard};

use proctor_core::error::StoreError;

#[derive(Debug)]
pub(crate) struct StoreLock {
    path: PathBuf,
    /// Queues writers of this process before they take an OS lock.
    local: Mutex<()>,
}

/// Held for the duration of one read-modify-write.
#[derive(Debug)]
pub(crate) struct StoreLockGuard<'a> {
    _file: File,
    _local: MutexGuard<'a, ()>,
}

impl StoreLock {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            local: Mutex::new(()),
        }
    }

    /// Wait for exclusive access.
    pub(crate) async fn acquire(&self) -> Result<StoreLockGuard<'_>, StoreError> {
        let local = self.local.lock().await;
        let path = self.path.clone();
        let file = tokio::task::spawn_blocking(move || lock_file(&path))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;
        Ok(StoreLockGuard {
            _file: file,
            _local: local,
        })
    }
}

fn lock_file(path: &Path) -> std::io::Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    FileExt::lock_exclusive(&file)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn separate_handles_exclude_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.lock");
        let held = Arc::new(AtomicBool::new(false));
        let overlaps = Arc::new(AtomicU32::new(0));

        // Separate `StoreLock`s share nothing in-process, like two CLI runs.
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lock = StoreLock::new(path.clone());
                let held = Arc::clone(&held);
                let overlaps = Arc::clone(&overlaps);
                tokio::spawn(async move {
                    for _ in 0..10 {
                        let _guard = lock.acquire().await.unwrap();
                        if held.swap(true, Ordering::SeqCst) {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                        held.store(false, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
