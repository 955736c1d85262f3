//! Mime-type policy
//!
//! The policy table is built once at start-up and passed by reference into
//! the graph builder, the walker consumers and the transfer code. It answers
//! three questions about a remote mime type:
//!
//! - is it a folder or a shortcut,
//! - does it need a server-side export (and to which format),
//! - is it a native type with no export at all (skip list).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mime type of remote folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Mime type of remote shortcuts
pub const SHORTCUT_MIME_TYPE: &str = "application/vnd.google-apps.shortcut";

/// Prefix shared by third-party app objects, none of which can be exported
pub const DRIVE_SDK_PREFIX: &str = "application/vnd.google-apps.drive-sdk.";

const SKIPPED_TYPES: &[&str] = &[
    "application/vnd.google-apps.fusiontable",
    "application/vnd.google-apps.map",
];

const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PPTX: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const BUILT_IN_EXPORTS: &[(&str, &str, &str)] = &[
    ("application/vnd.google-apps.document", DOCX, ".docx"),
    ("application/vnd.google-apps.presentation", PPTX, ".pptx"),
    ("application/vnd.google-apps.spreadsheet", XLSX, ".xlsx"),
    ("application/vnd.google-apps.drawing", "image/svg+xml", ".svg"),
    ("application/vnd.google-apps.jam", "application/pdf", ".pdf"),
    (
        "application/vnd.google-apps.script",
        "application/vnd.google-apps.script+json",
        ".json",
    ),
    ("application/vnd.google-apps.form", "application/zip", ".zip"),
    ("application/vnd.google-apps.site", "text/plain", ".txt"),
];

/// Target interchange format for a native document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFormat {
    /// Mime type requested from the export endpoint
    pub mime_type: String,
    /// Extension appended to the local path, including the leading dot
    pub extension: String,
}

impl ExportFormat {
    pub fn new(mime_type: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            extension: extension.into(),
        }
    }
}

/// How a remote object is handled locally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind<'a> {
    Folder,
    Shortcut,
    /// Native document converted server-side
    Export(&'a ExportFormat),
    /// Native type with no export format; never downloaded
    Unsupported,
    /// Regular binary content downloaded as-is
    Blob,
}

/// Read-only mime-type lookup table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimePolicy {
    exports: BTreeMap<String, ExportFormat>,
}

impl MimePolicy {
    /// Built-in table for Google Workspace native types
    pub fn google_workspace() -> Self {
        let exports = BUILT_IN_EXPORTS
            .iter()
            .map(|(source, target, ext)| (source.to_string(), ExportFormat::new(*target, *ext)))
            .collect();
        Self { exports }
    }

    /// Merges `overrides` over the current table (override wins)
    #[must_use]
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, ExportFormat>) -> Self {
        for (source, format) in overrides {
            self.exports.insert(source.clone(), format.clone());
        }
        self
    }

    /// Classifies a mime type
    pub fn classify(&self, mime_type: &str) -> ContentKind<'_> {
        if mime_type == FOLDER_MIME_TYPE {
            ContentKind::Folder
        } else if mime_type == SHORTCUT_MIME_TYPE {
            ContentKind::Shortcut
        } else if self.is_skipped(mime_type) {
            ContentKind::Unsupported
        } else if let Some(format) = self.exports.get(mime_type) {
            ContentKind::Export(format)
        } else {
            ContentKind::Blob
        }
    }

    /// Returns the export format for a native type, if any
    pub fn export_format(&self, mime_type: &str) -> Option<&ExportFormat> {
        self.exports.get(mime_type)
    }

    /// Returns true for native types that have no export format
    pub fn is_skipped(&self, mime_type: &str) -> bool {
        if self.exports.contains_key(mime_type) {
            return false;
        }
        SKIPPED_TYPES.contains(&mime_type) || mime_type.starts_with(DRIVE_SDK_PREFIX)
    }

    /// Number of export entries in the table
    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }
}

impl Default for MimePolicy {
    fn default() -> Self {
        Self::google_workspace()
    }
}
