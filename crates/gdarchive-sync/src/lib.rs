//! gdarchive Sync - Incremental download pipeline
//!
//! Provides:
//! - Freshness checks against existing local files (MD5 or modification time)
//! - Streaming transfers with export conversion and export-link fallback
//! - A bounded worker pool fed by the cycle-safe tree walk
//!
//! ## Modules
//!
//! - [`checker`] - Decides whether a local copy is already current
//! - [`transfer`] - Exporter/downloader writing one file per record
//! - [`coordinator`] - Producer/worker pool archiving one tree

pub mod checker;
pub mod coordinator;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;

use gdarchive_core::ports::RemoteError;
use thiserror::Error;

pub use checker::SyncChecker;
pub use coordinator::{
    plan_tree, worker_count, DownloadCoordinator, Job, JobPlanner, Planned, TreeSummary,
};
pub use transfer::{Transfer, TransferOutcome};

/// Errors that fail the transfer of a single file
///
/// None of these abort a tree download; the coordinator logs them and moves
/// on to the next job.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The remote call failed after retries
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Writing the local file failed
    #[error("IO error on {path}: {source}")]
    Io {
        /// Local file being written
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote modification time is not RFC 3339
    #[error("Invalid modification time '{value}': {source}")]
    InvalidTimestamp {
        /// Value reported remotely
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The export was too large and the record publishes no link for the format
    #[error("No export link for {mime_type}")]
    NoExportLink {
        /// Target mime type of the export
        mime_type: String,
    },
}
