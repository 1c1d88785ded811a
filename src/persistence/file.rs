//! Append-only text-file audit sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::AuditSink;
use super::models::AuditRecord;
use crate::error::WatchError;

/// Audit trail written as one line per event.
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAuditLog {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns a [`WatchError::PersistenceError`] if the file cannot be
    /// opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, WatchError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| WatchError::PersistenceError(format!("{}: {e}", path.display())))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for FileAuditLog {
    async fn record(&self, record: &AuditRecord) -> Result<(), WatchError> {
        let mut line = record.to_line();
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| WatchError::PersistenceError(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| WatchError::PersistenceError(e.to_string()))
    }
}
