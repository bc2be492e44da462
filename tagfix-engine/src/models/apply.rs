//! Apply outcome and audit value types

use crate::models::diff::AlbumField;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One before/after entry of an audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Stable field name ("title", "track 1-3", "cover_art_url", ...)
    pub field: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Audit trail of one successful apply, written in the same transaction as
/// the changes it describes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub guid: Uuid,
    pub album_guid: Uuid,
    /// Source attribution: the catalog release the values came from
    pub source_mbid: String,
    /// RFC 3339 timestamp of the commit
    pub applied_at: String,
    pub entries: Vec<AuditEntry>,
}

/// Exactly what a successful apply wrote
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppliedChanges {
    /// Scalar/array/external-id fields written
    pub fields: Vec<AlbumField>,
    pub tracks_modified: usize,
    pub tracks_added: usize,
    pub tracks_removed: usize,
    pub cover_art_changed: bool,
}

impl AppliedChanges {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
            && self.tracks_modified == 0
            && self.tracks_added == 0
            && self.tracks_removed == 0
            && !self.cover_art_changed
    }
}

/// Result of a successful apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub applied: AppliedChanges,
    pub audit: AuditRecord,
    /// Fresh optimistic-lock token after the commit
    pub new_token: String,
}
