//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v3 responses.

use std::collections::BTreeMap;

use gdarchive_core::domain::Record;
use serde::{Deserialize, Serialize};

/// Google Drive API file resource, restricted to the fields gdarchive requests
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub mime_type: String,

    /// MD5 checksum (binary files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_checksum: Option<String>,

    /// Modification time (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,

    /// Parent folder IDs
    #[serde(default)]
    pub parents: Vec<String>,

    /// Present on shortcuts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_details: Option<ShortcutDetails>,

    /// Export URLs keyed by target mime type (native documents only)
    #[serde(default)]
    pub export_links: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutDetails {
    pub target_id: Option<String>,
}

impl From<DriveFile> for Record {
    fn from(file: DriveFile) -> Self {
        Record {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            parents: file.parents,
            md5_checksum: file.md5_checksum.filter(|c| !c.is_empty()),
            modified_time: file.modified_time.filter(|t| !t.is_empty()),
            shortcut_target_id: file.shortcut_details.and_then(|d| d.target_id),
            export_links: file.export_links,
        }
    }
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for the next page; absent on the last page
    pub next_page_token: Option<String>,
}

/// Response of `files.get` with `fields=id`
#[derive(Debug, Deserialize)]
pub struct FileId {
    pub id: String,
}

/// Google API error envelope
///
/// ```json
/// {"error": {"code": 403, "message": "...", "errors": [{"reason": "rateLimitExceeded"}]}}
/// ```
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorItem {
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    /// Machine-readable reasons, in the order reported
    pub fn reasons(&self) -> Vec<String> {
        self.errors.iter().filter_map(|e| e.reason.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_drive_file() {
        let json = r#"{
            "id": "abc123",
            "name": "Budget",
            "mimeType": "application/vnd.google-apps.spreadsheet",
            "modifiedTime": "2024-01-02T00:00:00.000Z",
            "parents": ["folder1"],
            "exportLinks": {
                "application/pdf": "https://docs.google.com/export?id=abc123&format=pdf"
            }
        }"#;

        let file: DriveFile = serde_json::from_str(json).unwrap();
        let record = Record::from(file);

        assert_eq!(record.id, "abc123");
        assert_eq!(record.parents, vec!["folder1".to_string()]);
        assert!(record.md5_checksum.is_none());
        assert_eq!(record.modified_time.as_deref(), Some("2024-01-02T00:00:00.000Z"));
        assert_eq!(record.export_links.len(), 1);
    }

    #[test]
    fn test_shortcut_target_is_flattened() {
        let json = r#"{
            "id": "s1",
            "name": "Link",
            "mimeType": "application/vnd.google-apps.shortcut",
            "shortcutDetails": {"targetId": "t1"}
        }"#;

        let record = Record::from(serde_json::from_str::<DriveFile>(json).unwrap());
        assert!(record.is_shortcut());
        assert_eq!(record.shortcut_target_id.as_deref(), Some("t1"));
        assert!(record.parents.is_empty());
    }

    #[test]
    fn test_deserialize_file_list() {
        let json = r#"{
            "files": [{"id": "a", "name": "a.txt", "mimeType": "text/plain"}],
            "nextPageToken": "p2"
        }"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 1);
        assert_eq!(list.next_page_token.as_deref(), Some("p2"));

        let last: FileList = serde_json::from_str("{}").unwrap();
        assert!(last.files.is_empty());
        assert!(last.next_page_token.is_none());
    }

    #[test]
    fn test_deserialize_error_envelope() {
        let json = r#"{
            "error": {
                "code": 403,
                "message": "This file is too large to be exported.",
                "errors": [{
                    "domain": "global",
                    "reason": "exportSizeLimitExceeded",
                    "message": "too large"
                }]
            }
        }"#;

        let envelope: ErrorEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.error.code, Some(403));
        assert_eq!(envelope.error.reasons(), vec!["exportSizeLimitExceeded".to_string()]);
    }
}
