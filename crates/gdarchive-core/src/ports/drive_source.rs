//! Drive source port (driven/secondary port)
//!
//! This module defines the interface to the remote drive: listing every
//! metadata record of an account and fetching content. The Google Drive
//! adapter lives in `gdarchive-drive`; tests use in-memory implementations.
//!
//! ## Design Notes
//!
//! - Errors are a closed [`RemoteError`] enum rather than `anyhow::Error`
//!   because retry and export fallback need to classify them.
//! - Content is returned as a [`ByteStream`] so transfers never buffer a
//!   whole file in memory.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;

use crate::domain::record::Record;
use crate::retry::Retryable;

/// Error reason reported when the per-user request rate is exceeded
pub const REASON_RATE_LIMIT_EXCEEDED: &str = "rateLimitExceeded";

/// Error reason reported when the per-user quota rate is exceeded
pub const REASON_USER_RATE_LIMIT_EXCEEDED: &str = "userRateLimitExceeded";

/// Error reason reported when a document is too large to export
pub const REASON_EXPORT_SIZE_LIMIT_EXCEEDED: &str = "exportSizeLimitExceeded";

/// Streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RemoteError>> + Send>>;

// ============================================================================
// RemoteError
// ============================================================================

/// Errors reported by a drive source
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The API answered with a non-success status
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Human-readable message from the API
        message: String,
        /// Machine-readable reasons (e.g. `rateLimitExceeded`)
        reasons: Vec<String>,
    },

    /// The request never produced a response (connection, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Creates an API error without reasons
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            reasons: Vec::new(),
        }
    }

    /// Adds a reason to an API error; other variants are returned unchanged
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        if let Self::Api { reasons, .. } = &mut self {
            reasons.push(reason.into());
        }
        self
    }

    /// HTTP status, for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the API reported `reason`
    pub fn has_reason(&self, reason: &str) -> bool {
        match self {
            Self::Api { reasons, .. } => reasons.iter().any(|r| r == reason),
            _ => false,
        }
    }

    /// Returns true for quota and rate-limit conditions
    pub fn is_rate_limited(&self) -> bool {
        self.has_reason(REASON_RATE_LIMIT_EXCEEDED)
            || self.has_reason(REASON_USER_RATE_LIMIT_EXCEEDED)
    }

    /// Returns true if the export failed only because the document is too large
    pub fn is_export_size_limit(&self) -> bool {
        self.has_reason(REASON_EXPORT_SIZE_LIMIT_EXCEEDED)
    }
}

impl Retryable for RemoteError {
    /// Bad request, unauthorized, not found and not implemented are
    /// permanent, as is a permission error that is not a rate limit.
    /// Everything else, network failures included, is retried.
    fn is_retryable(&self) -> bool {
        match self.status() {
            Some(400 | 401 | 404 | 501) => false,
            Some(403) => self.is_rate_limited(),
            _ => true,
        }
    }
}

// ============================================================================
// IDriveSource trait
// ============================================================================

/// Remote drive operations needed to archive an account
#[async_trait::async_trait]
pub trait IDriveSource: Send + Sync {
    /// Resolves the id of the account's root folder
    async fn root_id(&self) -> Result<String, RemoteError>;

    /// Lists every metadata record of the account, following pagination
    async fn list_files(&self) -> Result<Vec<Record>, RemoteError>;

    /// Fetches the raw content of a binary file
    async fn download(&self, file_id: &str) -> Result<ByteStream, RemoteError>;

    /// Fetches a native document converted to `mime_type`
    async fn export(&self, file_id: &str, mime_type: &str) -> Result<ByteStream, RemoteError>;

    /// Fetches a published export link
    async fn fetch_url(&self, url: &str) -> Result<ByteStream, RemoteError>;
}
