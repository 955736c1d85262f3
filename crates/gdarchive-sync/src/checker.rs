//! Local freshness checks
//!
//! Decides whether an existing local file already reflects a remote object:
//!
//! - **Exported documents** have no remote checksum. The local copy is
//!   current when its modification time is at or after the remote one.
//! - **Everything else** is current when the MD5 of the local file equals the
//!   remote `md5Checksum`.
//!
//! A missing local file, an unknown remote time or checksum, or any I/O error
//! while checking means the file is downloaded.

use std::path::Path;

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use tokio::io::AsyncReadExt;
use tracing::trace;

use gdarchive_core::domain::Record;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Incremental-sync heuristic
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncChecker;

impl SyncChecker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns true when `record` must be transferred to `local_path`
    ///
    /// `exported` selects the modification-time rule instead of the
    /// checksum rule.
    pub async fn should_download(
        &self,
        record: &Record,
        exported: bool,
        local_path: &Path,
    ) -> bool {
        let current = if exported {
            self.mtime_is_current(record, local_path).await
        } else {
            self.checksum_matches(record, local_path).await
        };
        trace!(path = %local_path.display(), exported, current, "Freshness check");
        !current
    }

    /// True if the local file's mtime is not before the remote modification time
    pub async fn mtime_is_current(&self, record: &Record, local_path: &Path) -> bool {
        let Some(Ok(remote)) = record.parsed_modified_time() else {
            return false;
        };
        let Ok(metadata) = tokio::fs::metadata(local_path).await else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }
        match metadata.modified() {
            Ok(local) => DateTime::<Utc>::from(local) >= remote,
            Err(_) => false,
        }
    }

    /// True if the local file's MD5 equals the remote checksum
    pub async fn checksum_matches(&self, record: &Record, local_path: &Path) -> bool {
        let Some(expected) = record.md5_checksum.as_deref() else {
            return false;
        };
        match file_md5(local_path).await {
            Ok(actual) => actual.eq_ignore_ascii_case(expected),
            Err(_) => false,
        }
    }
}

/// Hex-encoded MD5 of a local file, read in chunks
pub async fn file_md5(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
