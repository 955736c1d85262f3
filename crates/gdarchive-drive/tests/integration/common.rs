//! Shared test helpers for Drive API integration tests
//!
//! Provides wiremock-based mock server setup for Google Drive endpoints.
//! Each helper mounts the necessary mock endpoints and returns a configured
//! client pointing at the mock server.

use std::time::Duration;

use futures_util::StreamExt;
use gdarchive_core::ports::ByteStream;
use gdarchive_core::retry::RetryPolicy;
use gdarchive_drive::{DriveClient, GoogleDriveSource};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-access-token";

/// Sets up a mock server with the root endpoint and returns
/// a (MockServer, DriveClient) tuple.
///
/// Pre-configured endpoints:
/// - GET /files/root?fields=id → `{"id": "root-001"}`
pub async fn setup_drive_mock() -> (MockServer, DriveClient) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/root"))
        .and(query_param("fields", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "root-001"
        })))
        .mount(&server)
        .await;

    let client = DriveClient::with_base_url(TEST_TOKEN, server.uri());

    (server, client)
}

/// Wraps `client` in a source whose retries are fast enough for tests.
pub fn fast_source(client: DriveClient, max_attempts: u32) -> GoogleDriveSource {
    GoogleDriveSource::new(client)
        .with_retry_policy(RetryPolicy::new(Duration::from_millis(5), max_attempts))
}

/// Builds a Google API error envelope.
pub fn error_body(code: u16, reason: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "errors": [{"domain": "global", "reason": reason, "message": message}]
        }
    })
}

/// Mounts a raw content download for `file_id`.
pub async fn mount_download(server: &MockServer, file_id: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{file_id}")))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Drains a byte stream into memory.
pub async fn collect(mut stream: ByteStream) -> Vec<u8> {
    let mut data = Vec::new();
    while let Some(chunk) = stream.next().await {
        data.extend_from_slice(&chunk.expect("stream chunk"));
    }
    data
}
