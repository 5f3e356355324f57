//! On-disk cache of the last fetched document per URL

use crate::url::{is_snapshot_file_name, snapshot_file_name};
use crate::{GuardError, GuardResult};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Directory of `snap_<sanitized-url>.html` files
///
/// The read-previous/write-current swap runs under one lock so two tasks
/// fetching URLs that map to the same file never observe a half-written
/// snapshot.
#[derive(Debug)]
pub struct SnapshotCache {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(snapshot_file_name(url))
    }

    /// Stores `document` as the snapshot for `url`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(previous))` - The snapshot written by an earlier fetch
    /// * `Ok(None)` - First fetch of this URL
    /// * `Err(GuardError::Snapshot)` - The cache could not be read or written
    pub async fn swap(&self, url: &str, document: &str) -> GuardResult<Option<String>> {
        let snapshot_error = |source| GuardError::Snapshot {
            url: url.to_string(),
            source,
        };
        let path = self.path_for(url);

        let _guard = self.lock.lock().await;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(snapshot_error)?;

        let previous = match tokio::fs::read_to_string(&path).await {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(snapshot_error(e)),
        };

        tokio::fs::write(&path, document)
            .await
            .map_err(snapshot_error)?;

        Ok(previous)
    }
}

/// Lists snapshot file names in `dir`, sorted
///
/// Returns `Ok(None)` when the directory does not exist.
pub fn list_snapshots(dir: &Path) -> GuardResult<Option<Vec<String>>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if is_snapshot_file_name(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(Some(names))
}
