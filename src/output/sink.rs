//! Append-only JSONL sinks
//!
//! Each sink owns a single file handle behind an async mutex, so concurrent
//! producers never interleave partial lines: a record is serialized first and
//! then written as one complete line while the lock is held.

use crate::{GuardError, GuardResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// A newline-delimited JSON file with a single serialized writer
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    /// Creates (or truncates) the sink file, creating parent directories
    pub async fn create(path: &Path) -> GuardResult<Self> {
        Self::open(path, true).await
    }

    /// Opens the sink file for appending, keeping existing lines
    pub async fn append_to(path: &Path) -> GuardResult<Self> {
        Self::open(path, false).await
    }

    async fn open(path: &Path, truncate: bool) -> GuardResult<Self> {
        let sink_error = |source| GuardError::Sink {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(sink_error)?;
        }

        let mut options = OpenOptions::new();
        if truncate {
            options.write(true).create(true).truncate(true);
        } else {
            options.append(true).create(true);
        }
        let file = options.open(path).await.map_err(sink_error)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Appends one record as a single JSON line
    pub async fn append<T: Serialize>(&self, record: &T) -> GuardResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|source| self.error(source))?;
        file.flush().await.map_err(|source| self.error(source))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, source: std::io::Error) -> GuardError {
        GuardError::Sink {
            path: self.path.display().to_string(),
            source,
        }
    }
}
