use crate::{KnowledgeBaseError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Exclusive advisory lock on `<store>.lock`, released on drop.
pub(crate) struct StoreWriteLock {
    file: File,
}

impl Drop for StoreWriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

pub(crate) fn lock_path_for_store(store_path: &Path) -> PathBuf {
    let mut name = store_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    store_path.with_file_name(name)
}

/// Blocks until no other writer (thread or process) holds the store.
pub(crate) fn acquire_store_write_lock(store_path: &Path) -> Result<StoreWriteLock> {
    let path = lock_path_for_store(store_path);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&path)
        .map_err(|err| {
            KnowledgeBaseError::Other(format!("open store lock {}: {err}", path.display()))
        })?;

    let start = Instant::now();
    file.lock_exclusive().map_err(|err| {
        KnowledgeBaseError::Other(format!("acquire store lock {}: {err}", path.display()))
    })?;
    log::debug!(
        "store lock {} acquired after {}ms",
        path.display(),
        start.elapsed().as_millis()
    );

    Ok(StoreWriteLock { file })
}
