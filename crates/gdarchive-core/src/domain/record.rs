//! Remote metadata records
//!
//! A [`Record`] is the port-level description of one remote object as the
//! listing collaborator reports it. Records are flat: hierarchy is expressed
//! only through parent ids, and shortcuts only through a target id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mime::{FOLDER_MIME_TYPE, SHORTCUT_MIME_TYPE};

/// One flat metadata entry for a remote object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Provider-specific object identifier
    pub id: String,
    /// Display name (not unique, may contain any character)
    pub name: String,
    /// Remote mime type, used to classify the object
    pub mime_type: String,
    /// Ids of the folders containing this object (zero or more)
    #[serde(default)]
    pub parents: Vec<String>,
    /// Hex-encoded MD5 of the content (binary files only)
    pub md5_checksum: Option<String>,
    /// Last modification time as reported remotely (RFC 3339)
    pub modified_time: Option<String>,
    /// Target object id when this record is a shortcut
    pub shortcut_target_id: Option<String>,
    /// Published export links keyed by target mime type
    #[serde(default)]
    pub export_links: BTreeMap<String, String>,
}

impl Record {
    /// Creates a record with the given identity and no other metadata
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    /// Creates a folder record
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, FOLDER_MIME_TYPE)
    }

    /// Creates a shortcut record pointing at `target_id`
    pub fn shortcut(
        id: impl Into<String>,
        name: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            shortcut_target_id: Some(target_id.into()),
            ..Self::new(id, name, SHORTCUT_MIME_TYPE)
        }
    }

    /// Adds a parent id
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parents.push(parent_id.into());
        self
    }

    /// Sets the content checksum
    #[must_use]
    pub fn with_md5(mut self, checksum: impl Into<String>) -> Self {
        self.md5_checksum = Some(checksum.into());
        self
    }

    /// Sets the remote modification time (RFC 3339)
    #[must_use]
    pub fn with_modified_time(mut self, modified: impl Into<String>) -> Self {
        self.modified_time = Some(modified.into());
        self
    }

    /// Adds a published export link for `mime_type`
    #[must_use]
    pub fn with_export_link(
        mut self,
        mime_type: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        self.export_links.insert(mime_type.into(), url.into());
        self
    }

    /// Returns true if the record describes a folder
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    /// Returns true if the record describes a shortcut
    pub fn is_shortcut(&self) -> bool {
        self.mime_type == SHORTCUT_MIME_TYPE
    }

    /// Parses the remote modification time
    ///
    /// Returns `None` when no time was reported and `Some(Err(..))` when the
    /// reported value is not valid RFC 3339.
    pub fn parsed_modified_time(&self) -> Option<Result<DateTime<Utc>, chrono::ParseError>> {
        self.modified_time
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(|value| DateTime::parse_from_rfc3339(value).map(|t| t.with_timezone(&Utc)))
    }
}
