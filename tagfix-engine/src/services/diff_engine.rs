//! Field-level diff engine
//!
//! One comparator per field shape (text, date, array, external identifier,
//! artist credit, cover art) plus `diff_album`, which assembles the complete
//! field diff list for an (album, source) pair. Every comparator is pure and
//! total: empty is a valid value meaning "absent", never an error.
//!
//! Shared classification rule:
//! - absent + absent → `Unchanged`
//! - absent + present → `Added`
//! - present + absent → `Removed`
//! - present + present, normalized-equal → `Unchanged`
//! - present + present, normalized-different → `Modified` (scalar) or
//!   `Modified`/`Conflict` (array, depending on the direction of divergence)

use crate::models::{
    AlbumField, AlbumRecord, ArtistCredit, ArtistCreditDiff, ChangeClass, CoverArtDiff,
    DateComponentChanges, DiffPart, FieldDiff, SourceRecord, Summary, TrackListSummary,
};
use crate::models::record::render_artist_credits;
use crate::services::normalizer::{are_equal, non_blank, normalize, parse_date_components};
use crate::services::text_diff::{diff_chars, diff_parts};

/// Classify two optional scalar values under the shared rule
fn classify_scalar(current: Option<&str>, source: Option<&str>) -> ChangeClass {
    match (non_blank(current), non_blank(source)) {
        (None, None) => ChangeClass::Unchanged,
        (None, Some(_)) => ChangeClass::Added,
        (Some(_), None) => ChangeClass::Removed,
        (Some(c), Some(s)) => {
            if are_equal(c, s) {
                ChangeClass::Unchanged
            } else {
                ChangeClass::Modified
            }
        }
    }
}

/// Compare a free-text field
///
/// Span parts are computed only in the `Modified` case: character-level for
/// short values, word-level for long ones (see [`diff_parts`]).
pub fn compare_text(
    field: AlbumField,
    current: Option<&str>,
    source: Option<&str>,
) -> FieldDiff {
    let classification = classify_scalar(current, source);

    let parts = match classification {
        ChangeClass::Modified => Some(diff_parts(
            non_blank(current).unwrap_or(""),
            non_blank(source).unwrap_or(""),
        )),
        _ => None,
    };

    FieldDiff::Text {
        field,
        classification,
        current: non_blank(current).map(str::to_string),
        source: non_blank(source).map(str::to_string),
        parts,
    }
}

/// Compare an opaque external identifier
///
/// Same classification as text, but IDs are never diffed at the character
/// level; a changed MBID is simply a different MBID.
pub fn compare_external_id(
    field: AlbumField,
    current: Option<&str>,
    source: Option<&str>,
) -> FieldDiff {
    FieldDiff::ExternalId {
        field,
        classification: classify_scalar(current, source),
        current: non_blank(current).map(str::to_string),
        source: non_blank(source).map(str::to_string),
    }
}

/// Compare a partial date field, classifying each component and the whole
///
/// Unparseable stored values are treated as absent; the normalizer only
/// accepts `YYYY`, `YYYY-MM`, and `YYYY-MM-DD`.
pub fn compare_date(field: AlbumField, current: Option<&str>, source: Option<&str>) -> FieldDiff {
    let current_date = non_blank(current).and_then(parse_date_components);
    let source_date = non_blank(source).and_then(parse_date_components);

    let year = classify_component(
        current_date.map(|d| d.year as i64),
        source_date.map(|d| d.year as i64),
    );
    let month = classify_component(
        current_date.and_then(|d| d.month).map(i64::from),
        source_date.and_then(|d| d.month).map(i64::from),
    );
    let day = classify_component(
        current_date.and_then(|d| d.day).map(i64::from),
        source_date.and_then(|d| d.day).map(i64::from),
    );

    let classification = match (current_date, source_date) {
        (None, None) => ChangeClass::Unchanged,
        (None, Some(_)) => ChangeClass::Added,
        (Some(_), None) => ChangeClass::Removed,
        (Some(_), Some(_)) => {
            if year.is_change() || month.is_change() || day.is_change() {
                ChangeClass::Modified
            } else {
                ChangeClass::Unchanged
            }
        }
    };

    FieldDiff::Date {
        field,
        classification,
        current: current_date,
        source: source_date,
        component_changes: DateComponentChanges { year, month, day },
    }
}

fn classify_component(current: Option<i64>, source: Option<i64>) -> ChangeClass {
    match (current, source) {
        (None, None) => ChangeClass::Unchanged,
        (None, Some(_)) => ChangeClass::Added,
        (Some(_), None) => ChangeClass::Removed,
        (Some(c), Some(s)) => {
            if c == s {
                ChangeClass::Unchanged
            } else {
                ChangeClass::Modified
            }
        }
    }
}

/// Compare a set-valued field (labels, genres)
///
/// Both sides are treated as sets after normalization; display values keep
/// their original casing. Classification: pure creation → `Added`, pure
/// removal of everything → `Removed`, divergence in both directions →
/// `Conflict`, one-directional change → `Modified`.
pub fn compare_array(field: AlbumField, current: &[String], source: &[String]) -> FieldDiff {
    let current_items = dedupe_normalized(current);
    let source_items = dedupe_normalized(source);

    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut unchanged = Vec::new();

    for (key, display) in &current_items {
        if source_items.iter().any(|(k, _)| k == key) {
            unchanged.push(display.clone());
        } else {
            removed.push(display.clone());
        }
    }
    for (key, display) in &source_items {
        if !current_items.iter().any(|(k, _)| k == key) {
            added.push(display.clone());
        }
    }

    let classification = if current_items.is_empty() && source_items.is_empty() {
        ChangeClass::Unchanged
    } else if current_items.is_empty() {
        ChangeClass::Added
    } else if source_items.is_empty() {
        ChangeClass::Removed
    } else if added.is_empty() && removed.is_empty() {
        ChangeClass::Unchanged
    } else if !added.is_empty() && !removed.is_empty() {
        ChangeClass::Conflict
    } else {
        ChangeClass::Modified
    };

    FieldDiff::Array {
        field,
        classification,
        current: current_items.into_iter().map(|(_, d)| d).collect(),
        source: source_items.into_iter().map(|(_, d)| d).collect(),
        added,
        removed,
        unchanged,
    }
}

/// Deduplicate by normalized key, keeping the first display spelling and
/// dropping blanks
fn dedupe_normalized(values: &[String]) -> Vec<(String, String)> {
    let mut items: Vec<(String, String)> = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = normalize(trimmed);
        if !items.iter().any(|(k, _)| *k == key) {
            items.push((key, trimmed.to_string()));
        }
    }
    items
}

/// Compare two artist credit lists via their rendered display strings
pub fn compare_artist_credits(
    current: &[ArtistCredit],
    source: &[ArtistCredit],
) -> ArtistCreditDiff {
    let current_display = render_artist_credits(current);
    let source_display = render_artist_credits(source);

    let classification = classify_scalar(Some(&current_display), Some(&source_display));

    let parts: Option<Vec<DiffPart>> = match classification {
        ChangeClass::Modified => Some(diff_chars(&current_display, &source_display)),
        _ => None,
    };

    ArtistCreditDiff {
        classification,
        current_display,
        source_display,
        parts,
    }
}

/// Compare cover art URLs (opaque; exact comparison after trimming)
pub fn compare_cover_art(current: Option<&str>, source: Option<&str>) -> CoverArtDiff {
    let current_url = non_blank(current).map(str::to_string);
    let source_url = non_blank(source).map(str::to_string);

    let classification = match (&current_url, &source_url) {
        (None, None) => ChangeClass::Unchanged,
        (None, Some(_)) => ChangeClass::Added,
        (Some(_), None) => ChangeClass::Removed,
        (Some(c), Some(s)) => {
            if c == s {
                ChangeClass::Unchanged
            } else {
                ChangeClass::Modified
            }
        }
    };

    CoverArtDiff {
        current_url,
        source_url,
        classification,
    }
}

/// Diff every album field against the source record
pub fn diff_album(album: &AlbumRecord, source: &SourceRecord) -> Vec<FieldDiff> {
    vec![
        compare_text(AlbumField::Title, Some(&album.title), Some(&source.title)),
        compare_date(
            AlbumField::ReleaseDate,
            album.release_date.as_deref(),
            source.release_date.as_deref(),
        ),
        compare_text(
            AlbumField::Country,
            album.country.as_deref(),
            source.country.as_deref(),
        ),
        compare_text(
            AlbumField::Barcode,
            album.barcode.as_deref(),
            source.barcode.as_deref(),
        ),
        compare_array(AlbumField::Labels, &album.labels, &source.labels),
        compare_array(AlbumField::Genres, &album.genres, &source.genres),
        compare_external_id(
            AlbumField::ReleaseMbid,
            album.release_mbid.as_deref(),
            Some(&source.release_mbid),
        ),
        compare_external_id(
            AlbumField::ArtistMbid,
            album.artist_mbid.as_deref(),
            source.artist_mbid.as_deref(),
        ),
    ]
}

/// Roll up classifications into the result summary
///
/// The artist credit and cover art comparisons count as fields alongside the
/// typed field diffs.
pub fn summarize(
    field_diffs: &[FieldDiff],
    artist_credit: &ArtistCreditDiff,
    cover_art: &CoverArtDiff,
    track_summary: &TrackListSummary,
) -> Summary {
    let classifications = field_diffs
        .iter()
        .map(FieldDiff::classification)
        .chain([artist_credit.classification, cover_art.classification]);

    let mut summary = Summary {
        total_fields: 0,
        changed_fields: 0,
        added_fields: 0,
        modified_fields: 0,
        conflict_fields: 0,
        has_track_changes: track_summary.modified > 0
            || track_summary.added > 0
            || track_summary.removed > 0,
    };

    for classification in classifications {
        summary.total_fields += 1;
        match classification {
            ChangeClass::Unchanged => {}
            ChangeClass::Added => {
                summary.changed_fields += 1;
                summary.added_fields += 1;
            }
            ChangeClass::Removed => {
                summary.changed_fields += 1;
            }
            ChangeClass::Modified => {
                summary.changed_fields += 1;
                summary.modified_fields += 1;
            }
            ChangeClass::Conflict => {
                summary.changed_fields += 1;
                summary.conflict_fields += 1;
            }
        }
    }

    summary
}
