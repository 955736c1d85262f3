//! Google Drive API client
//!
//! Provides a typed HTTP client for the Drive v3 REST API. Handles the
//! bearer header, endpoint construction, JSON decoding and translation of
//! Google's error envelope into [`RemoteError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gdarchive_drive::client::DriveClient;
//!
//! # async fn example() -> Result<(), gdarchive_core::ports::RemoteError> {
//! let client = DriveClient::new("access-token-here");
//! let root = client.get_root_id().await?;
//! println!("root folder: {root}");
//! # Ok(())
//! # }
//! ```

use futures_util::StreamExt;
use gdarchive_core::ports::{ByteStream, RemoteError};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{ErrorEnvelope, FileId, FileList};

/// Base URL for the Google Drive API v3
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Largest page size accepted by files.list
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Fields requested for every listed file
const LIST_FIELDS: &str = concat!(
    "nextPageToken,",
    "files(id,name,mimeType,md5Checksum,modifiedTime,parents,shortcutDetails/targetId,exportLinks)"
);

// ============================================================================
// DriveClient
// ============================================================================

/// HTTP client for Google Drive API calls
///
/// Wraps `reqwest::Client` with the bearer token and base URL. Every call
/// makes exactly one request; retrying is left to the caller.
#[derive(Debug, Clone)]
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// OAuth2 access token
    access_token: String,
}

impl DriveClient {
    /// Creates a client for the production API
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DRIVE_API_BASE)
    }

    /// Creates a client with a custom base URL (useful for testing)
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for `path` under the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url).bearer_auth(&self.access_token)
    }

    /// Resolves the id of the user's root folder (`GET /files/root?fields=id`)
    pub async fn get_root_id(&self) -> Result<String, RemoteError> {
        debug!("Fetching root folder id");
        let request = self
            .request(Method::GET, "/files/root")
            .query(&[("fields", "id")]);
        let file: FileId = self.send_json(request).await?;
        Ok(file.id)
    }

    /// Fetches one page of the user's files
    pub async fn list_page(&self, page_token: Option<&str>) -> Result<FileList, RemoteError> {
        let page_size = MAX_PAGE_SIZE.to_string();
        let mut request = self.request(Method::GET, "/files").query(&[
            ("corpora", "user"),
            ("spaces", "drive"),
            ("pageSize", page_size.as_str()),
            ("fields", LIST_FIELDS),
        ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let page: FileList = self.send_json(request).await?;
        debug!(
            files = page.files.len(),
            more = page.next_page_token.is_some(),
            "Fetched file list page"
        );
        Ok(page)
    }

    /// Streams the raw content of a binary file (`GET /files/{id}?alt=media`)
    pub async fn download(&self, file_id: &str) -> Result<ByteStream, RemoteError> {
        debug!(id = file_id, "Downloading file");
        let request = self
            .request(Method::GET, &format!("/files/{file_id}"))
            .query(&[("alt", "media")]);
        let response = self.send(request).await?;
        Ok(body_stream(response))
    }

    /// Streams a native document converted to `mime_type`
    pub async fn export(&self, file_id: &str, mime_type: &str) -> Result<ByteStream, RemoteError> {
        debug!(id = file_id, mime_type, "Exporting file");
        let request = self
            .request(Method::GET, &format!("/files/{file_id}/export"))
            .query(&[("mimeType", mime_type)]);
        let response = self.send(request).await?;
        Ok(body_stream(response))
    }

    /// Streams an absolute URL (a published export link) with the bearer token
    pub async fn fetch_url(&self, url: &str) -> Result<ByteStream, RemoteError> {
        debug!(url, "Fetching export link");
        let request = self.client.get(url).bearer_auth(&self.access_token);
        let response = self.send(request).await?;
        Ok(body_stream(response))
    }

    /// Sends `request` and maps transport failures and error statuses
    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = self.send(request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }
}

fn body_stream(response: Response) -> ByteStream {
    response
        .bytes_stream()
        .map(|chunk| chunk.map_err(|e| RemoteError::Network(e.to_string())))
        .boxed()
}

/// Decodes Google's error envelope, falling back to the raw body
async fn error_from_response(response: Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => RemoteError::Api {
            status: status.as_u16(),
            reasons: envelope.error.reasons(),
            message: envelope.error.message,
        },
        Err(_) => {
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            };
            RemoteError::api(status.as_u16(), message)
        }
    }
}
