//! GoogleDriveSource - IDriveSource implementation for the Drive v3 API
//!
//! Wraps the [`DriveClient`] and fulfils the [`IDriveSource`] port.
//! Root discovery and every listing page run under the source's
//! [`RetryPolicy`]; content calls are single requests because the transfer
//! layer owns their retries (it needs to see the final error to decide on
//! the export-link fallback).

use async_trait::async_trait;
use gdarchive_core::domain::Record;
use gdarchive_core::ports::{ByteStream, IDriveSource, RemoteError};
use gdarchive_core::retry::RetryPolicy;
use tracing::{debug, info};

use crate::client::DriveClient;

/// Drive source backed by the Google Drive REST API
#[derive(Debug, Clone)]
pub struct GoogleDriveSource {
    client: DriveClient,
    retry: RetryPolicy,
}

impl GoogleDriveSource {
    /// Creates a source with the default retry policy
    pub fn new(client: DriveClient) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn client(&self) -> &DriveClient {
        &self.client
    }
}

#[async_trait]
impl IDriveSource for GoogleDriveSource {
    async fn root_id(&self) -> Result<String, RemoteError> {
        self.retry
            .run("files.get(root)", || self.client.get_root_id())
            .await
    }

    async fn list_files(&self) -> Result<Vec<Record>, RemoteError> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let token = page_token.as_deref();
            let page = self
                .retry
                .run("files.list", || self.client.list_page(token))
                .await?;
            pages += 1;

            records.extend(page.files.into_iter().map(Record::from));
            debug!(pages, records = records.len(), "Listing in progress");

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        info!(pages, records = records.len(), "Listed drive files");
        Ok(records)
    }

    async fn download(&self, file_id: &str) -> Result<ByteStream, RemoteError> {
        self.client.download(file_id).await
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<ByteStream, RemoteError> {
        self.client.export(file_id, mime_type).await
    }

    async fn fetch_url(&self, url: &str) -> Result<ByteStream, RemoteError> {
        self.client.fetch_url(url).await
    }
}
