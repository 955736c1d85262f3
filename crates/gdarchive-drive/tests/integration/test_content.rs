//! Integration tests for content transfers
//!
//! Verifies raw downloads, exports, export-link fetches and the decoding of
//! error reasons the transfer layer depends on.

use gdarchive_core::ports::{IDriveSource, RemoteError};
use gdarchive_core::retry::Retryable;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::common;

// ============================================================================
// Download tests
// ============================================================================

#[tokio::test]
async fn test_download_streams_content() {
    let (server, client) = common::setup_drive_mock().await;

    let content = b"Hello, Drive! This is test content.";
    common::mount_download(&server, "file-001", content).await;

    let stream = client.download("file-001").await.expect("download");
    assert_eq!(common::collect(stream).await, content);
}

#[tokio::test]
async fn test_download_large_file() {
    let (server, client) = common::setup_drive_mock().await;

    let content: Vec<u8> = (0..1_048_576).map(|i| (i % 251) as u8).collect();
    common::mount_download(&server, "large-001", &content).await;

    let source = common::fast_source(client, 1);
    let data = common::collect(source.download("large-001").await.unwrap()).await;
    assert_eq!(data.len(), content.len());
    assert_eq!(data, content);
}

#[tokio::test]
async fn test_download_not_found_is_permanent() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files/missing-001"))
        .respond_with(ResponseTemplate::new(404).set_body_json(common::error_body(
            404,
            "notFound",
            "File not found: missing-001.",
        )))
        .mount(&server)
        .await;

    let err = match client.download("missing-001").await {
        Ok(_) => panic!("expected an error"),
        Err(err) => err,
    };
    assert_eq!(err.status(), Some(404));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_error_without_envelope_keeps_body() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files/broken-001"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway from proxy"))
        .mount(&server)
        .await;

    let err = match client.download("broken-001").await {
        Ok(_) => panic!("expected an error"),
        Err(err) => err,
    };
    assert_eq!(
        err,
        RemoteError::api(502, "Bad Gateway from proxy")
    );
    assert!(err.is_retryable());
}

// ============================================================================
// Export tests
// ============================================================================

#[tokio::test]
async fn test_export_requests_target_mime_type() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files/doc-001/export"))
        .and(query_param(
            "mimeType",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04docx".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let stream = client
        .export(
            "doc-001",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        )
        .await
        .expect("export");
    assert_eq!(common::collect(stream).await, b"PK\x03\x04docx");
}

#[tokio::test]
async fn test_export_size_limit_reason_is_reported() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files/huge-001/export"))
        .respond_with(ResponseTemplate::new(403).set_body_json(common::error_body(
            403,
            "exportSizeLimitExceeded",
            "This file is too large to be exported.",
        )))
        .mount(&server)
        .await;

    let err = match client.export("huge-001", "application/pdf").await {
        Ok(_) => panic!("expected an error"),
        Err(err) => err,
    };
    assert!(err.is_export_size_limit());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_fetch_url_sends_bearer_token() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/export-links/huge-001"))
        .and(query_param("exportFormat", "pdf"))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/export-links/huge-001?exportFormat=pdf", server.uri());
    let stream = client.fetch_url(&url).await.expect("fetch export link");
    assert_eq!(common::collect(stream).await, b"%PDF-1.7");
}
