//! Diff value types
//!
//! `FieldDiff` is a closed sum type with one variant per comparator, so every
//! consumer is exhaustiveness-checked by the compiler instead of sniffing a
//! shared shape at runtime.

use crate::models::record::{AlbumRecord, SourceRecord};
use serde::{Deserialize, Serialize};

/// How a compared value changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeClass {
    /// Both sides empty, or normalized-equal
    Unchanged,
    /// Current empty, source present
    Added,
    /// Current present, source empty
    Removed,
    /// Both present, normalized-different
    Modified,
    /// Both present with divergence in both directions (array comparator)
    Conflict,
}

impl ChangeClass {
    /// True for anything other than `Unchanged`
    pub fn is_change(self) -> bool {
        self != ChangeClass::Unchanged
    }
}

/// Album fields the diff engine compares and the apply service can write
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlbumField {
    Title,
    ArtistCredits,
    ReleaseDate,
    Country,
    Barcode,
    Labels,
    Genres,
    ReleaseMbid,
    ArtistMbid,
}

impl AlbumField {
    /// Stable name used in audit entries and logs
    pub fn as_str(self) -> &'static str {
        match self {
            AlbumField::Title => "title",
            AlbumField::ArtistCredits => "artist_credits",
            AlbumField::ReleaseDate => "release_date",
            AlbumField::Country => "country",
            AlbumField::Barcode => "barcode",
            AlbumField::Labels => "labels",
            AlbumField::Genres => "genres",
            AlbumField::ReleaseMbid => "release_mbid",
            AlbumField::ArtistMbid => "artist_mbid",
        }
    }
}

/// One span of a character- or word-level text diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffPart {
    pub value: String,
    /// Present only in the source side
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub added: bool,
    /// Present only in the current side
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub removed: bool,
}

impl DiffPart {
    pub fn equal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            added: false,
            removed: false,
        }
    }

    pub fn added(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            added: true,
            removed: false,
        }
    }

    pub fn removed(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            added: false,
            removed: true,
        }
    }
}

/// Partial date: year, year-month, or full date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateComponents {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

impl DateComponents {
    /// Render back to the stored partial-date form (`YYYY`, `YYYY-MM`, or
    /// `YYYY-MM-DD`)
    pub fn to_partial_string(&self) -> String {
        match (self.month, self.day) {
            (Some(month), Some(day)) => format!("{:04}-{:02}-{:02}", self.year, month, day),
            (Some(month), None) => format!("{:04}-{:02}", self.year, month),
            _ => format!("{:04}", self.year),
        }
    }
}

/// Per-component classification of a date diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateComponentChanges {
    pub year: ChangeClass,
    pub month: ChangeClass,
    pub day: ChangeClass,
}

/// One compared field, tagged by comparator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldDiff {
    /// Free-text field with optional span-level diff
    Text {
        field: AlbumField,
        classification: ChangeClass,
        current: Option<String>,
        source: Option<String>,
        /// Present only when both sides are non-empty and unequal
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parts: Option<Vec<DiffPart>>,
    },
    /// Partial date field with per-component classification
    Date {
        field: AlbumField,
        classification: ChangeClass,
        current: Option<DateComponents>,
        source: Option<DateComponents>,
        component_changes: DateComponentChanges,
    },
    /// Set-valued field (labels, genres)
    Array {
        field: AlbumField,
        classification: ChangeClass,
        current: Vec<String>,
        source: Vec<String>,
        added: Vec<String>,
        removed: Vec<String>,
        unchanged: Vec<String>,
    },
    /// Opaque external identifier; never diffed at the character level
    ExternalId {
        field: AlbumField,
        classification: ChangeClass,
        current: Option<String>,
        source: Option<String>,
    },
}

impl FieldDiff {
    pub fn field(&self) -> AlbumField {
        match self {
            FieldDiff::Text { field, .. }
            | FieldDiff::Date { field, .. }
            | FieldDiff::Array { field, .. }
            | FieldDiff::ExternalId { field, .. } => *field,
        }
    }

    pub fn classification(&self) -> ChangeClass {
        match self {
            FieldDiff::Text { classification, .. }
            | FieldDiff::Date { classification, .. }
            | FieldDiff::Array { classification, .. }
            | FieldDiff::ExternalId { classification, .. } => *classification,
        }
    }
}

/// Ordered artist-credit comparison rendered as display strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistCreditDiff {
    pub classification: ChangeClass,
    pub current_display: String,
    pub source_display: String,
    /// Character-level diff of the two display strings when they differ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<DiffPart>>,
}

/// Classification of one aligned track slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackChange {
    /// Titles normalized-equal at this slot
    Match,
    /// Both present, title or duration differs
    Modified,
    /// Source has a track this slot the current record lacks
    Added,
    /// Current record has a track this slot the source lacks
    Removed,
}

/// Minimal track view carried in a diff slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSlot {
    pub title: String,
    pub duration_ms: Option<u32>,
    pub recording_mbid: Option<String>,
}

/// One aligned (disc, position) slot of the track comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackDiff {
    pub disc_number: u32,
    pub position: u32,
    pub change: TrackChange,
    pub current: Option<TrackSlot>,
    pub source: Option<TrackSlot>,
    /// Local row identity of the current side, used by the apply service to
    /// address the track
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_track_guid: Option<uuid::Uuid>,
    /// Title span diff when both sides present and titles differ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_parts: Option<Vec<DiffPart>>,
    /// Absolute duration difference when both durations are known and unequal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_delta_ms: Option<u32>,
}

/// Rollup counts over all track slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackListSummary {
    pub total_current: usize,
    pub total_source: usize,
    pub matching: usize,
    pub modified: usize,
    pub added: usize,
    pub removed: usize,
}

/// Cover art comparison (URLs treated as opaque)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverArtDiff {
    pub current_url: Option<String>,
    pub source_url: Option<String>,
    pub classification: ChangeClass,
}

/// Rollup over all field diffs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_fields: usize,
    pub changed_fields: usize,
    pub added_fields: usize,
    pub modified_fields: usize,
    pub conflict_fields: usize,
    pub has_track_changes: bool,
}

/// Complete reconciliation of one (album, candidate) pair
///
/// Constructed fresh per preview, held by the caller for the duration of
/// operator review, and discarded after apply or cancellation. Never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub album: AlbumRecord,
    pub source: SourceRecord,
    pub field_diffs: Vec<FieldDiff>,
    pub artist_credit: ArtistCreditDiff,
    pub track_diffs: Vec<TrackDiff>,
    pub track_summary: TrackListSummary,
    pub cover_art: CoverArtDiff,
    pub summary: Summary,
}
