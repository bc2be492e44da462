//! Operator field selections
//!
//! Selections are derived from a `ReconciliationResult` by the caller's
//! presentation layer. The apply service intersects them with the actual
//! diffs, so a selection for an unchanged (or absent) field never produces a
//! write.

use crate::models::diff::AlbumField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Operator's choice for cover art
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverArtChoice {
    /// Replace the local URL with the source URL
    UseSource,
    /// Leave the local URL untouched
    KeepCurrent,
    /// Clear the local URL
    Clear,
}

/// Which track slots to apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSelection {
    /// Apply all track diffs except the excluded slots
    pub apply_all: bool,
    /// (disc_number, position) slots the operator opted out of
    pub excluded_slots: BTreeSet<(u32, u32)>,
}

impl TrackSelection {
    /// Apply every track diff
    pub fn all() -> Self {
        Self {
            apply_all: true,
            excluded_slots: BTreeSet::new(),
        }
    }

    /// Apply no track diffs
    pub fn none() -> Self {
        Self {
            apply_all: false,
            excluded_slots: BTreeSet::new(),
        }
    }

    /// Whether the given slot should be applied
    pub fn includes(&self, disc_number: u32, position: u32) -> bool {
        self.apply_all && !self.excluded_slots.contains(&(disc_number, position))
    }
}

/// Operator's per-field choices for one apply call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSelections {
    /// Scalar/array/external-id fields to accept from the source
    pub fields: BTreeSet<AlbumField>,
    /// Track policy
    pub tracks: TrackSelection,
    /// Cover art choice
    pub cover_art: CoverArtChoice,
}

impl FieldSelections {
    /// Accept nothing (useful as a starting point for callers)
    pub fn empty() -> Self {
        Self {
            fields: BTreeSet::new(),
            tracks: TrackSelection::none(),
            cover_art: CoverArtChoice::KeepCurrent,
        }
    }

    /// Accept every field, all tracks, and the source cover art
    pub fn accept_all() -> Self {
        use AlbumField::*;
        Self {
            fields: BTreeSet::from([
                Title,
                ArtistCredits,
                ReleaseDate,
                Country,
                Barcode,
                Labels,
                Genres,
                ReleaseMbid,
                ArtistMbid,
            ]),
            tracks: TrackSelection::all(),
            cover_art: CoverArtChoice::UseSource,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_selection_exclusion() {
        let mut selection = TrackSelection::all();
        selection.excluded_slots.insert((1, 3));

        assert!(selection.includes(1, 1));
        assert!(!selection.includes(1, 3));
    }

    #[test]
    fn test_track_selection_none_includes_nothing() {
        let selection = TrackSelection::none();
        assert!(!selection.includes(1, 1));
    }
}
