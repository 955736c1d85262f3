//! Exporter/downloader
//!
//! Transfers one record to one local path:
//!
//! 1. Classify the record through the [`MimePolicy`]
//! 2. Skip it when the local copy is current ([`SyncChecker`])
//! 3. Fetch the content under the retry policy; native documents are
//!    exported, and an export rejected for size falls back to the record's
//!    published export link
//! 4. Stream the body into a freshly created file and set its modification
//!    time to the remote one
//!
//! A body that fails mid-stream leaves no partial file behind.

use std::path::Path;
use std::sync::Arc;

use chrono::DateTime;
use filetime::FileTime;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use gdarchive_core::domain::{ContentKind, ExportFormat, MimePolicy, Record};
use gdarchive_core::ports::{ByteStream, IDriveSource};
use gdarchive_core::retry::RetryPolicy;

use crate::checker::SyncChecker;
use crate::TransferError;

/// What happened to one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Content was written to the local path
    Downloaded,
    /// The local copy was already current
    SkippedExisting,
    /// The type has no downloadable content (skip-listed, folder, shortcut)
    Unsupported,
}

/// Performs the content transfer for download jobs
pub struct Transfer {
    source: Arc<dyn IDriveSource>,
    policy: Arc<MimePolicy>,
    retry: RetryPolicy,
    checker: SyncChecker,
}

impl Transfer {
    pub fn new(source: Arc<dyn IDriveSource>, policy: Arc<MimePolicy>, retry: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            retry,
            checker: SyncChecker::new(),
        }
    }

    pub fn policy(&self) -> &Arc<MimePolicy> {
        &self.policy
    }

    /// Brings `dest` up to date with `record`
    pub async fn transfer(
        &self,
        record: &Record,
        dest: &Path,
    ) -> Result<TransferOutcome, TransferError> {
        match self.policy.classify(&record.mime_type) {
            ContentKind::Export(format) => {
                if !self.checker.should_download(record, true, dest).await {
                    return Ok(TransferOutcome::SkippedExisting);
                }
                let body = self.fetch_export(record, format).await?;
                write_body(body, dest, record.modified_time.as_deref()).await?;
                Ok(TransferOutcome::Downloaded)
            }
            ContentKind::Blob => {
                if !self.checker.should_download(record, false, dest).await {
                    return Ok(TransferOutcome::SkippedExisting);
                }
                let body = self
                    .retry
                    .run("files.get(media)", || self.source.download(&record.id))
                    .await?;
                write_body(body, dest, record.modified_time.as_deref()).await?;
                Ok(TransferOutcome::Downloaded)
            }
            ContentKind::Unsupported | ContentKind::Folder | ContentKind::Shortcut => {
                Ok(TransferOutcome::Unsupported)
            }
        }
    }

    async fn fetch_export(
        &self,
        record: &Record,
        format: &ExportFormat,
    ) -> Result<ByteStream, TransferError> {
        let exported = self
            .retry
            .run("files.export", || self.source.export(&record.id, &format.mime_type))
            .await;

        match exported {
            Ok(body) => Ok(body),
            Err(err) if err.is_export_size_limit() => {
                let url = record.export_links.get(&format.mime_type).ok_or_else(|| {
                    TransferError::NoExportLink {
                        mime_type: format.mime_type.clone(),
                    }
                })?;
                info!(
                    id = %record.id,
                    mime_type = %format.mime_type,
                    "Export too large, following export link"
                );
                let body = self
                    .retry
                    .run("export link", || self.source.fetch_url(url))
                    .await?;
                Ok(body)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Streams `body` into a new file at `path` and applies `modified_time`
///
/// An empty or absent time leaves the mtime alone; an unparsable one is an
/// error because it would defeat the next run's freshness check.
pub async fn write_body(
    body: ByteStream,
    path: &Path,
    modified_time: Option<&str>,
) -> Result<(), TransferError> {
    let io_err = |source: std::io::Error| TransferError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::create(path).await.map_err(io_err)?;
    if let Err(err) = copy_body(body, file, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            debug!(path = %path.display(), error = %cleanup, "Could not remove partial file");
        }
        return Err(err);
    }

    let Some(value) = modified_time.filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    let parsed =
        DateTime::parse_from_rfc3339(value).map_err(|source| TransferError::InvalidTimestamp {
            value: value.to_string(),
            source,
        })?;
    let mtime = FileTime::from_unix_time(parsed.timestamp(), parsed.timestamp_subsec_nanos());
    filetime::set_file_times(path, mtime, mtime).map_err(io_err)?;
    Ok(())
}

async fn copy_body(
    mut body: ByteStream,
    mut file: tokio::fs::File,
    path: &Path,
) -> Result<(), TransferError> {
    let io_err = |source: std::io::Error| TransferError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut written = 0usize;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len();
    }
    file.flush().await.map_err(io_err)?;
    debug!(path = %path.display(), bytes = written, "Body written");
    Ok(())
}
