//! Value types for the reconciliation engine

pub mod apply;
pub mod candidate;
pub mod diff;
pub mod record;
pub mod selections;

pub use apply::{AppliedChanges, ApplyOutcome, AuditEntry, AuditRecord};
pub use candidate::{RawCandidate, ScoreBreakdown, ScoredCandidate};
pub use diff::{
    AlbumField, ArtistCreditDiff, ChangeClass, CoverArtDiff, DateComponentChanges, DateComponents,
    DiffPart, FieldDiff, ReconciliationResult, Summary, TrackChange, TrackDiff, TrackListSummary,
    TrackSlot,
};
pub use record::{AlbumRecord, ArtistCredit, SourceRecord, SourceTrack, TrackRecord};
pub use selections::{CoverArtChoice, FieldSelections, TrackSelection};
