//! Integration tests for root discovery and paged listing
//!
//! Verifies query parameters, pagination, mapping into records and the
//! retry behavior of the listing calls.

use gdarchive_core::ports::IDriveSource;
use wiremock::{
    matchers::{header, method, path, query_param, query_param_is_missing},
    Mock, ResponseTemplate,
};

use crate::common;

// ============================================================================
// Root discovery
// ============================================================================

#[tokio::test]
async fn test_root_id() {
    let (_server, client) = common::setup_drive_mock().await;

    let root = client.get_root_id().await.expect("root id");
    assert_eq!(root, "root-001");
}

#[tokio::test]
async fn test_root_id_through_source() {
    let (_server, client) = common::setup_drive_mock().await;
    let source = common::fast_source(client, 3);

    assert_eq!(source.root_id().await.unwrap(), "root-001");
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_follows_pagination() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(header("authorization", "Bearer test-access-token"))
        .and(query_param("corpora", "user"))
        .and(query_param("spaces", "drive"))
        .and(query_param("pageSize", "1000"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nextPageToken": "page-2",
            "files": [
                {
                    "id": "folder-1",
                    "name": "Projects",
                    "mimeType": "application/vnd.google-apps.folder",
                    "parents": ["root-001"],
                    "modifiedTime": "2024-02-01T08:00:00.000Z"
                },
                {
                    "id": "file-1",
                    "name": "report.pdf",
                    "mimeType": "application/pdf",
                    "parents": ["folder-1"],
                    "md5Checksum": "9e107d9d372bb6826bd81d3542a419d6",
                    "modifiedTime": "2024-02-02T08:00:00.000Z"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [
                {
                    "id": "link-1",
                    "name": "report shortcut",
                    "mimeType": "application/vnd.google-apps.shortcut",
                    "parents": ["root-001"],
                    "shortcutDetails": {"targetId": "file-1"}
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = common::fast_source(client, 3);
    let records = source.list_files().await.expect("list files");

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["folder-1", "file-1", "link-1"]);
    assert!(records[0].is_folder());
    assert_eq!(
        records[1].md5_checksum.as_deref(),
        Some("9e107d9d372bb6826bd81d3542a419d6")
    );
    assert_eq!(records[2].shortcut_target_id.as_deref(), Some("file-1"));
}

#[tokio::test]
async fn test_list_empty_drive() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"files": []})))
        .mount(&server)
        .await;

    let records = common::fast_source(client, 1).list_files().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_list_retries_server_errors() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{"id": "a", "name": "a.txt", "mimeType": "text/plain"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = common::fast_source(client, 3).list_files().await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_list_retries_rate_limited_permission_error() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(403).set_body_json(common::error_body(
            403,
            "rateLimitExceeded",
            "Rate Limit Exceeded",
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"files": []})))
        .mount(&server)
        .await;

    let result = common::fast_source(client, 3).list_files().await;
    assert!(result.is_ok(), "expected retry to succeed: {result:?}");
}

#[tokio::test]
async fn test_list_does_not_retry_unauthorized() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(401).set_body_json(common::error_body(
            401,
            "authError",
            "Invalid Credentials",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let err = common::fast_source(client, 5).list_files().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(err.has_reason("authError"));
    assert!(err.to_string().contains("Invalid Credentials"));
}

#[tokio::test]
async fn test_list_gives_up_after_max_attempts() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let err = common::fast_source(client, 3).list_files().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_list_rejects_malformed_body() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client.list_page(None).await.unwrap_err();
    assert!(matches!(err, gdarchive_core::ports::RemoteError::InvalidResponse(_)));
}
